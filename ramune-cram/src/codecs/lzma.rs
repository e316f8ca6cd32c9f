use std::io::{self, Read};

use lzma_rust2::XzReader;

// Decode-only: the writer never emits LZMA blocks, but the closed method set
// includes them on read.
pub fn decode(src: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = XzReader::new(src, false);
    let mut dst = Vec::new();
    decoder.read_to_end(&mut dst)?;
    Ok(dst)
}
