use std::io::{self, Read};

use super::read_u8;

/// Reads an LTF-8 encoded 64-bit integer.
///
/// This is the 64-bit analogue of ITF-8, using 1 to 9 bytes.
pub fn read_ltf8<R>(reader: &mut R) -> io::Result<i64>
where
    R: Read,
{
    let b0 = read_u8(reader).map(u64::from)?;

    let n = if b0 & 0x80 == 0 {
        b0
    } else if b0 & 0x40 == 0 {
        ((b0 & 0x3f) << 8) | read_trailing(reader, 1)?
    } else if b0 & 0x20 == 0 {
        ((b0 & 0x1f) << 16) | read_trailing(reader, 2)?
    } else if b0 & 0x10 == 0 {
        ((b0 & 0x0f) << 24) | read_trailing(reader, 3)?
    } else if b0 & 0x08 == 0 {
        ((b0 & 0x07) << 32) | read_trailing(reader, 4)?
    } else if b0 & 0x04 == 0 {
        ((b0 & 0x03) << 40) | read_trailing(reader, 5)?
    } else if b0 & 0x02 == 0 {
        ((b0 & 0x01) << 48) | read_trailing(reader, 6)?
    } else if b0 & 0x01 == 0 {
        read_trailing(reader, 7)?
    } else {
        read_trailing(reader, 8)?
    };

    Ok(n as i64)
}

fn read_trailing<R>(reader: &mut R, len: usize) -> io::Result<u64>
where
    R: Read,
{
    let mut n = 0;

    for _ in 0..len {
        let b = read_u8(reader).map(u64::from)?;
        n = (n << 8) | b;
    }

    Ok(n)
}

/// Reads an LTF-8 encoded integer, converting it to type `N`.
pub fn read_ltf8_as<R, N>(reader: &mut R) -> io::Result<N>
where
    R: Read,
    N: TryFrom<i64>,
    <N as TryFrom<i64>>::Error: std::error::Error + Send + Sync + 'static,
{
    read_ltf8(reader).and_then(|n| {
        n.try_into()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ltf8() -> io::Result<()> {
        fn t(mut data: &[u8], expected: i64) -> io::Result<()> {
            assert_eq!(read_ltf8(&mut data)?, expected);
            Ok(())
        }

        t(&[0x00], 0)?;
        t(&[0x55], 85)?;
        t(&[0x80, 0xaa], 170)?;
        t(&[0xc0, 0x55, 0xaa], 0x55aa)?;
        t(&[0xe0, 0x55, 0xaa, 0xcc], 0x55aacc)?;
        t(&[0xf0, 0x55, 0xaa, 0xcc, 0x33], 0x55aa_cc33)?;
        t(&[0xf8, 0x55, 0xaa, 0xcc, 0x33, 0xe3], 0x55_aacc_33e3)?;
        t(&[0xfc, 0x55, 0xaa, 0xcc, 0x33, 0xe3, 0x1c], 0x55aa_cc33_e31c)?;
        t(
            &[0xfe, 0x55, 0xaa, 0xcc, 0x33, 0xe3, 0x1c, 0xf0],
            0x55_aacc_33e3_1cf0,
        )?;
        t(
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            -1,
        )?;

        Ok(())
    }

    #[test]
    fn test_read_ltf8_with_truncated_input() {
        let data = [0xf0, 0x55, 0xaa];
        assert!(matches!(
            read_ltf8(&mut &data[..]),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof,
        ));
    }
}
