use std::io::{self, Write};

use super::num::write_itf8;

/// Writes a length-prefixed byte array.
pub(super) fn write_array<W>(writer: &mut W, buf: &[u8]) -> io::Result<()>
where
    W: Write,
{
    let len = i32::try_from(buf.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    write_itf8(writer, len)?;
    writer.write_all(buf)
}

/// Writes a map framing: a length-prefixed buffer holding an item count
/// followed by the items.
pub(super) fn write_map<W>(writer: &mut W, item_count: usize, items: &[u8]) -> io::Result<()>
where
    W: Write,
{
    let n = i32::try_from(item_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut buf = Vec::new();
    write_itf8(&mut buf, n)?;
    buf.extend_from_slice(items);

    write_array(writer, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_array() -> io::Result<()> {
        let mut buf = Vec::new();
        write_array(&mut buf, &[0x0a, 0x0b, 0x0c])?;
        assert_eq!(buf, [0x03, 0x0a, 0x0b, 0x0c]);
        Ok(())
    }

    #[test]
    fn test_write_map() -> io::Result<()> {
        let mut buf = Vec::new();
        write_map(&mut buf, 2, &[0x0a, 0x0b])?;
        assert_eq!(buf, [0x03, 0x02, 0x0a, 0x0b]);
        Ok(())
    }
}
