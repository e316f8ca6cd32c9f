use std::io::{self, Read};

use bzip2::{Compression, read::{BzDecoder, BzEncoder}};

pub fn decode(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = BzDecoder::new(src);
    let mut dst = Vec::new();
    decoder.read_to_end(&mut dst)?;
    Ok(dst)
}

pub fn encode(compression_level: Compression, src: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(src, compression_level);
    let mut dst = Vec::new();
    encoder.read_to_end(&mut dst)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() -> io::Result<()> {
        let data = b"ramune ramune ramune";
        let compressed = encode(Compression::default(), data)?;
        assert_eq!(decode(&compressed)?, data);
        Ok(())
    }
}
