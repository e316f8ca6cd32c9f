//! CRAM block.

pub(crate) mod compression_method;
pub(crate) mod content_type;

pub(crate) use self::{compression_method::CompressionMethod, content_type::ContentType};

use std::{borrow::Cow, io};

use crate::codecs::{bzip2, gzip, lzma, name_tokenizer, rans_4x8, rans_nx16};

/// An external block content id.
pub(crate) type ContentId = i32;

/// A typed, optionally compressed byte container.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Block {
    pub(crate) compression_method: CompressionMethod,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: ContentId,
    pub(crate) uncompressed_size: usize,
    pub(crate) src: Vec<u8>,
}

impl Block {
    /// Returns the uncompressed block data.
    ///
    /// For raw blocks, this borrows the stored buffer; otherwise, the
    /// method-specific inflater runs and the result must have exactly
    /// `uncompressed_size` bytes.
    pub fn decode(&self) -> io::Result<Cow<'_, [u8]>> {
        let buf = match self.compression_method {
            CompressionMethod::None => Cow::Borrowed(&self.src[..]),
            CompressionMethod::Gzip => Cow::Owned(gzip::decode(&self.src)?),
            CompressionMethod::Bzip2 => Cow::Owned(bzip2::decode(&self.src)?),
            CompressionMethod::Lzma => Cow::Owned(lzma::decode(&self.src)?),
            CompressionMethod::Rans4x8 => Cow::Owned(rans_4x8::decode(&mut &self.src[..])?),
            CompressionMethod::RansNx16 => Cow::Owned(rans_nx16::decode(
                &mut &self.src[..],
                Some(self.uncompressed_size),
            )?),
            CompressionMethod::NameTokenizer => Cow::Owned(name_tokenizer::decode(&self.src)?),
            method => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported compression method: {method:?}"),
                ));
            }
        };

        if buf.len() != self.uncompressed_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "block size mismatch: expected {} bytes, got {}",
                    self.uncompressed_size,
                    buf.len()
                ),
            ));
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_raw() -> io::Result<()> {
        let block = Block {
            compression_method: CompressionMethod::None,
            content_type: ContentType::ExternalData,
            content_id: 1,
            uncompressed_size: 4,
            src: b"rmne".to_vec(),
        };

        assert_eq!(block.decode()?.as_ref(), b"rmne");

        Ok(())
    }

    #[test]
    fn test_decode_with_size_mismatch() {
        let block = Block {
            compression_method: CompressionMethod::None,
            content_type: ContentType::ExternalData,
            content_id: 1,
            uncompressed_size: 8,
            src: b"rmne".to_vec(),
        };

        assert!(matches!(
            block.decode(),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_decode_with_unsupported_method() {
        let block = Block {
            compression_method: CompressionMethod::Fqzcomp,
            content_type: ContentType::ExternalData,
            content_id: 1,
            uncompressed_size: 0,
            src: Vec::new(),
        };

        assert!(matches!(
            block.decode(),
            Err(e) if e.kind() == io::ErrorKind::Unsupported,
        ));
    }
}
