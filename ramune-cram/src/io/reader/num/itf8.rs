use std::io::{self, Read};

use super::read_u8;

/// Reads an ITF-8 encoded 32-bit integer.
///
/// The number of leading 1 bits in the first byte gives the number of
/// trailing bytes (0 to 4).
pub fn read_itf8<R>(reader: &mut R) -> io::Result<i32>
where
    R: Read,
{
    let b0 = read_u8(reader).map(u32::from)?;

    let n = if b0 & 0x80 == 0 {
        b0
    } else if b0 & 0x40 == 0 {
        let b1 = read_u8(reader).map(u32::from)?;
        ((b0 & 0x3f) << 8) | b1
    } else if b0 & 0x20 == 0 {
        let b1 = read_u8(reader).map(u32::from)?;
        let b2 = read_u8(reader).map(u32::from)?;
        ((b0 & 0x1f) << 16) | (b1 << 8) | b2
    } else if b0 & 0x10 == 0 {
        let b1 = read_u8(reader).map(u32::from)?;
        let b2 = read_u8(reader).map(u32::from)?;
        let b3 = read_u8(reader).map(u32::from)?;
        ((b0 & 0x0f) << 24) | (b1 << 16) | (b2 << 8) | b3
    } else {
        let b1 = read_u8(reader).map(u32::from)?;
        let b2 = read_u8(reader).map(u32::from)?;
        let b3 = read_u8(reader).map(u32::from)?;
        let b4 = read_u8(reader).map(u32::from)?;
        ((b0 & 0x0f) << 28) | (b1 << 20) | (b2 << 12) | (b3 << 4) | (b4 & 0x0f)
    };

    Ok(n as i32)
}

/// Reads an ITF-8 encoded integer, converting it to type `N`.
pub fn read_itf8_as<R, N>(reader: &mut R) -> io::Result<N>
where
    R: Read,
    N: TryFrom<i32>,
    <N as TryFrom<i32>>::Error: std::error::Error + Send + Sync + 'static,
{
    read_itf8(reader).and_then(|n| {
        n.try_into()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_itf8() -> io::Result<()> {
        fn t(mut data: &[u8], expected: i32) -> io::Result<()> {
            assert_eq!(read_itf8(&mut data)?, expected);
            Ok(())
        }

        t(&[0x00], 0)?;
        t(&[0x57], 87)?;
        t(&[0x80, 0xeb], 235)?;
        t(&[0xc0, 0x08, 0x9b], 2203)?;
        t(&[0xe0, 0x2d, 0xd9, 0x4e], 3004750)?;
        t(&[0xf0, 0x2e, 0xb9, 0x44, 0x05], 48993349)?;
        t(&[0xff, 0xff, 0xff, 0xff, 0x0f], -1)?;

        Ok(())
    }

    #[test]
    fn test_read_itf8_with_truncated_input() {
        let data = [0xc0, 0x08];
        assert!(matches!(
            read_itf8(&mut &data[..]),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof,
        ));
    }
}
