use std::io;

use flate2::Crc;

use crate::{
    container::{
        Block,
        block::{CompressionMethod, ContentType},
    },
    file_definition::Version,
    io::reader::num::{read_itf8, read_itf8_as, read_u8, read_u32_le},
};

pub(crate) fn read_block(src: &mut &[u8], version: Version) -> io::Result<Block> {
    let original = *src;

    let method = read_u8(src).and_then(|b| {
        CompressionMethod::try_from(b).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let content_type = read_u8(src).and_then(|b| {
        ContentType::try_from(b).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let content_id = read_itf8(src)?;
    let compressed_size: usize = read_itf8_as(src)?;
    let uncompressed_size: usize = read_itf8_as(src)?;

    if method == CompressionMethod::None && compressed_size != uncompressed_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "raw block size mismatch",
        ));
    }

    let data = src
        .split_off(..compressed_size)
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

    if version.has_crc32() {
        let end = original.len() - src.len();

        let mut crc = Crc::new();
        crc.update(&original[..end]);
        let actual_crc32 = crc.sum();

        let expected_crc32 = read_u32_le(src)?;

        if actual_crc32 != expected_crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "block checksum mismatch: expected {expected_crc32:08x}, got {actual_crc32:08x}"
                ),
            ));
        }
    }

    Ok(Block {
        compression_method: method,
        content_type,
        content_id,
        uncompressed_size,
        src: data.to_vec(),
    })
}

pub(crate) fn read_block_as(
    src: &mut &[u8],
    content_type: ContentType,
    version: Version,
) -> io::Result<Block> {
    let block = read_block(src, version)?;

    if block.content_type != content_type {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "invalid block content type: expected {:?}, got {:?}",
                content_type, block.content_type
            ),
        ));
    }

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_block() -> io::Result<()> {
        let src = [
            0x00, // compression method = none
            0x04, // content type = external data
            0x01, // content id = 1
            0x04, // compressed size = 4
            0x04, // uncompressed size = 4
            b'r', b'm', b'n', b'e', // data
            0xac, 0x16, 0xba, 0xed, // CRC32
        ];

        let mut reader = &src[..];
        let block = read_block(&mut reader, Version::V3_0)?;

        assert_eq!(block.compression_method, CompressionMethod::None);
        assert_eq!(block.content_type, ContentType::ExternalData);
        assert_eq!(block.content_id, 1);
        assert_eq!(block.uncompressed_size, 4);
        assert_eq!(block.src, b"rmne");

        Ok(())
    }

    #[test]
    fn test_read_block_without_crc32() -> io::Result<()> {
        let src = [
            0x00, // compression method = none
            0x04, // content type = external data
            0x01, // content id = 1
            0x00, // compressed size = 0
            0x00, // uncompressed size = 0
        ];

        let mut reader = &src[..];
        let block = read_block(&mut reader, Version::V2_1)?;

        assert!(block.src.is_empty());
        assert!(reader.is_empty());

        Ok(())
    }

    #[test]
    fn test_read_block_with_invalid_compression_method() {
        let src = [0x0a, 0x04, 0x01, 0x00, 0x00];

        assert!(matches!(
            read_block(&mut &src[..], Version::V2_1),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_read_block_with_raw_size_mismatch() {
        let src = [
            0x00, // compression method = none
            0x04, // content type = external data
            0x01, // content id = 1
            0x02, // compressed size = 2
            0x04, // uncompressed size = 4
            0x00, 0x00,
        ];

        assert!(matches!(
            read_block(&mut &src[..], Version::V2_1),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }
}
