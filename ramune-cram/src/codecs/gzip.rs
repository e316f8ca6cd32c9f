use std::io::{self, Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

pub fn decode(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(src);
    let mut dst = Vec::new();
    decoder.read_to_end(&mut dst)?;
    Ok(dst)
}

pub fn encode(compression_level: Compression, src: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), compression_level);
    encoder.write_all(src)?;
    encoder.finish()
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
