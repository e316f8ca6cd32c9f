use std::io::{self, Write};

use flate2::CrcWriter;

use crate::{
    codecs::{gzip, name_tokenizer, rans_4x8, rans_nx16},
    container::block::{CompressionMethod, ContentId, ContentType},
    file_definition::Version,
    io::writer::{Options, num::{write_itf8, write_u8, write_u32_le}},
};

/// A block staged for writing.
pub(crate) struct Block {
    pub(crate) compression_method: CompressionMethod,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: ContentId,
    pub(crate) uncompressed_size: usize,
    pub(crate) src: Vec<u8>,
}

impl Block {
    /// Compresses external block data with the smallest of the enabled
    /// methods, keeping it raw when nothing is smaller.
    pub(crate) fn external(
        options: &Options,
        content_id: ContentId,
        is_read_names: bool,
        src: Vec<u8>,
    ) -> io::Result<Self> {
        let uncompressed_size = src.len();

        let mut best = (CompressionMethod::None, src.clone());

        let mut consider = |method: CompressionMethod, result: io::Result<Vec<u8>>| {
            if let Ok(buf) = result {
                if buf.len() < best.1.len() {
                    best = (method, buf);
                }
            }
        };

        if !src.is_empty() {
            consider(
                CompressionMethod::Gzip,
                gzip::encode(flate2::Compression::default(), &src),
            );

            if options.use_bzip2 {
                consider(
                    CompressionMethod::Bzip2,
                    crate::codecs::bzip2::encode(bzip2::Compression::default(), &src),
                );
            }

            if options.use_rans {
                consider(
                    CompressionMethod::Rans4x8,
                    rans_4x8::encode(rans_4x8::Order::Zero, &src),
                );
                consider(
                    CompressionMethod::Rans4x8,
                    rans_4x8::encode(rans_4x8::Order::One, &src),
                );

                if options.version >= Version::V3_1 {
                    consider(
                        CompressionMethod::RansNx16,
                        rans_nx16::encode(rans_nx16::Flags::empty(), &src),
                    );
                }
            }

            if is_read_names && options.use_name_tokenizer && options.version >= Version::V3_1 {
                consider(CompressionMethod::NameTokenizer, name_tokenizer::encode(&src));
            }
        }

        let (compression_method, data) = best;

        Ok(Self {
            compression_method,
            content_type: ContentType::ExternalData,
            content_id,
            uncompressed_size,
            src: data,
        })
    }

    /// Wraps uncompressed data as a raw block.
    pub(crate) fn raw(content_type: ContentType, content_id: ContentId, src: Vec<u8>) -> Self {
        Self {
            compression_method: CompressionMethod::None,
            content_type,
            content_id,
            uncompressed_size: src.len(),
            src,
        }
    }

    /// Returns the serialized size of this block.
    pub(crate) fn size(&self, version: Version) -> io::Result<usize> {
        use crate::io::writer::num::itf8_size_of;

        let compressed_size = i32::try_from(self.src.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let uncompressed_size = i32::try_from(self.uncompressed_size)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut size = 2
            + itf8_size_of(self.content_id)
            + itf8_size_of(compressed_size)
            + itf8_size_of(uncompressed_size)
            + self.src.len();

        if version.has_crc32() {
            size += 4;
        }

        Ok(size)
    }
}

pub(crate) fn write_block<W>(writer: &mut W, block: &Block, version: Version) -> io::Result<()>
where
    W: Write,
{
    if version.has_crc32() {
        let mut crc_writer = CrcWriter::new(writer);
        write_block_body(&mut crc_writer, block)?;

        let crc32 = crc_writer.crc().sum();
        write_u32_le(crc_writer.get_mut(), crc32)
    } else {
        write_block_body(writer, block)
    }
}

fn write_block_body<W>(writer: &mut W, block: &Block) -> io::Result<()>
where
    W: Write,
{
    write_u8(writer, u8::from(block.compression_method))?;
    write_u8(writer, u8::from(block.content_type))?;
    write_itf8(writer, block.content_id)?;

    let compressed_size = i32::try_from(block.src.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(writer, compressed_size)?;

    let uncompressed_size = i32::try_from(block.uncompressed_size)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(writer, uncompressed_size)?;

    writer.write_all(&block.src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_block_round_trip() -> io::Result<()> {
        let block = Block::raw(ContentType::ExternalData, 1, b"rmne".to_vec());

        let mut buf = Vec::new();
        write_block(&mut buf, &block, Version::V3_0)?;

        assert_eq!(buf.len(), block.size(Version::V3_0)?);

        let decoded =
            crate::io::reader::container::read_block(&mut &buf[..], Version::V3_0)?;
        assert_eq!(decoded.src, b"rmne");
        assert_eq!(decoded.content_id, 1);

        Ok(())
    }

    #[test]
    fn test_external_compresses_repetitive_data() -> io::Result<()> {
        let options = Options::default();
        let data = b"ramune".repeat(100).to_vec();

        let block = Block::external(&options, 1, false, data.clone())?;

        assert_eq!(block.uncompressed_size, data.len());
        assert!(block.src.len() < data.len());
        assert_ne!(block.compression_method, CompressionMethod::None);

        Ok(())
    }

    #[test]
    fn test_external_keeps_tiny_data_raw() -> io::Result<()> {
        let options = Options::default();

        let block = Block::external(&options, 1, false, b"r".to_vec())?;

        assert_eq!(block.compression_method, CompressionMethod::None);
        assert_eq!(block.src, b"r");

        Ok(())
    }
}
