use std::io;

use super::num::read_itf8_as;

/// Reads a length-prefixed byte array.
pub(super) fn read_array<'a>(src: &mut &'a [u8]) -> io::Result<&'a [u8]> {
    let len: usize = read_itf8_as(src)?;

    src.split_off(..len)
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
}

/// Reads a map framing: a length-prefixed buffer holding an item count
/// followed by the items.
pub(super) fn read_map<'a>(src: &mut &'a [u8]) -> io::Result<(&'a [u8], usize)> {
    let mut buf = read_array(src)?;
    let len = read_itf8_as(&mut buf)?;
    Ok((buf, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_array() -> io::Result<()> {
        let mut src = &[0x03, 0x0a, 0x0b, 0x0c, 0xff][..];
        assert_eq!(read_array(&mut src)?, [0x0a, 0x0b, 0x0c]);
        assert_eq!(src, [0xff]);
        Ok(())
    }

    #[test]
    fn test_read_array_with_truncated_input() {
        let mut src = &[0x03, 0x0a][..];
        assert!(matches!(
            read_array(&mut src),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof,
        ));
    }

    #[test]
    fn test_read_map() -> io::Result<()> {
        let mut src = &[0x03, 0x02, 0x0a, 0x0b][..];
        let (buf, len) = read_map(&mut src)?;
        assert_eq!(buf, [0x0a, 0x0b]);
        assert_eq!(len, 2);
        Ok(())
    }
}
