use std::io::{self, Read};

use super::read_u8;

/// Reads a 7-bit variable-length unsigned integer.
///
/// This is the big-endian base-128 encoding used inside rANS Nx16 and name
/// tokenizer payloads.
pub fn read_uint7<R>(reader: &mut R) -> io::Result<u32>
where
    R: Read,
{
    let mut n = 0u32;
    let mut count = 0u8;

    loop {
        let b = read_u8(reader).map(u32::from)?;

        count += 1;
        if count > 5 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "VLQ integer overflow",
            ));
        }

        n <<= 7;
        n |= b & 0x7f;

        if b & 0x80 == 0 {
            break;
        }
    }

    Ok(n)
}

/// Reads a 7-bit variable-length unsigned integer, converting it to type `N`.
pub fn read_uint7_as<R, N>(reader: &mut R) -> io::Result<N>
where
    R: Read,
    N: TryFrom<u32>,
    <N as TryFrom<u32>>::Error: std::error::Error + Send + Sync + 'static,
{
    read_uint7(reader).and_then(|n| {
        n.try_into()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })
}
