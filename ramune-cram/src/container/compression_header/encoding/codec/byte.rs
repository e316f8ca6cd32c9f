use std::io;

use crate::{
    container::{
        block,
        compression_header::encoding::{
            Decode, Encode, Encoding, missing_external_block, null_codec_error,
        },
    },
    huffman::{CanonicalHuffmanDecoder, CanonicalHuffmanEncoder},
    io::{
        BitReader, BitWriter,
        reader::{container::slice::records::ExternalDataReaders, num::read_itf8},
        writer::container::slice::records::ExternalDataWriters,
    },
};

/// A byte codec.
#[derive(Clone, Debug)]
pub(crate) enum Byte {
    Null,
    External {
        block_content_id: block::ContentId,
    },
    Huffman {
        alphabet: Vec<i32>,
        bit_lens: Vec<u32>,
        decoder: CanonicalHuffmanDecoder,
        encoder: CanonicalHuffmanEncoder,
    },
    /// The bit-packing transform (`xpack`): the whole series is expanded
    /// once through the symbol map and served from a slice-scoped cache.
    Pack {
        codec_id: u32,
        bit_width: u32,
        value_map: Vec<u8>,
        sub_encoding: Box<Encoding<Byte>>,
    },
    /// The run-length transform (`xrle`): literals and run lengths are
    /// expanded once and served from a slice-scoped cache.
    Rle {
        codec_id: u32,
        run_symbols: Vec<u8>,
        len_block_content_id: block::ContentId,
        value_encoding: Box<Encoding<Byte>>,
    },
}

impl Byte {
    pub fn huffman(alphabet: Vec<i32>, bit_lens: Vec<u32>) -> Self {
        let decoder = CanonicalHuffmanDecoder::new(&alphabet, &bit_lens);
        let encoder = CanonicalHuffmanEncoder::new(&alphabet, &bit_lens);

        Self::Huffman {
            alphabet,
            bit_lens,
            decoder,
            encoder,
        }
    }

    /// Decodes `len` bytes into `dst`.
    pub fn decode_exact<'de>(
        &self,
        core_data_reader: &mut BitReader<'de>,
        external_data_readers: &mut ExternalDataReaders<'de>,
        dst: &mut Vec<u8>,
        len: usize,
    ) -> io::Result<()> {
        match self {
            Self::External { block_content_id } => {
                let src = external_data_readers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                let buf = src
                    .split_off(..len)
                    .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

                dst.extend_from_slice(buf);

                Ok(())
            }
            Self::Pack { .. } | Self::Rle { .. } => {
                let series = self.expanded(external_data_readers)?;
                let buf = series.read_exact(len)?;
                dst.extend_from_slice(buf);
                Ok(())
            }
            _ => {
                for _ in 0..len {
                    let b = self.decode(core_data_reader, external_data_readers)?;
                    dst.push(b);
                }

                Ok(())
            }
        }
    }

    /// Encodes all bytes of `src`.
    pub fn encode_exact(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        src: &[u8],
    ) -> io::Result<()> {
        match self {
            Self::External { block_content_id } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                dst.extend_from_slice(src);

                Ok(())
            }
            _ => {
                for &b in src {
                    self.encode(core_data_writer, external_data_writers, b)?;
                }

                Ok(())
            }
        }
    }

    /// Returns the slice-scoped expanded series for a transform codec,
    /// materializing it on first use.
    fn expanded<'r, 'de>(
        &self,
        external_data_readers: &'r mut ExternalDataReaders<'de>,
    ) -> io::Result<&'r mut crate::io::reader::container::slice::records::ExpandedSeries> {
        let codec_id = match self {
            Self::Pack { codec_id, .. } | Self::Rle { codec_id, .. } => *codec_id,
            _ => unreachable!(),
        };

        external_data_readers.expand_with(codec_id, |readers| self.expand_series(readers))
    }

    /// Materializes the whole data series a transform covers.
    fn expand_series(&self, external_data_readers: &mut ExternalDataReaders<'_>) -> io::Result<Vec<u8>> {
        match self {
            Self::External { block_content_id } => {
                let src = external_data_readers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                Ok(src.to_vec())
            }
            Self::Pack {
                bit_width,
                value_map,
                sub_encoding,
                ..
            } => {
                let packed = sub_encoding.get().expand_series(external_data_readers)?;
                expand_packed(&packed, *bit_width, value_map)
            }
            Self::Rle {
                run_symbols,
                len_block_content_id,
                value_encoding,
                ..
            } => {
                let literals = value_encoding.get().expand_series(external_data_readers)?;

                let lens = external_data_readers
                    .get_mut(len_block_content_id)
                    .ok_or_else(|| missing_external_block(*len_block_content_id))?;
                let mut lens = *lens;

                expand_runs(&literals, run_symbols, &mut lens)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "transform sub-encoding must be external or another transform",
            )),
        }
    }
}

fn expand_packed(packed: &[u8], bit_width: u32, value_map: &[u8]) -> io::Result<Vec<u8>> {
    if bit_width == 0 || bit_width > 8 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid pack bit width: {bit_width}"),
        ));
    }

    let values_per_byte = 8 / bit_width as usize;
    let mut dst = Vec::with_capacity(packed.len() * values_per_byte);

    let mut reader = BitReader::new(packed);
    let n = packed.len() * 8 / bit_width as usize;

    for _ in 0..n {
        let code = reader.read_u32(bit_width)? as usize;

        let b = value_map.get(code).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "invalid pack symbol code")
        })?;

        dst.push(b);
    }

    Ok(dst)
}

fn expand_runs(literals: &[u8], run_symbols: &[u8], lens: &mut &[u8]) -> io::Result<Vec<u8>> {
    let mut has_run = [false; 256];
    for &sym in run_symbols {
        has_run[usize::from(sym)] = true;
    }

    let mut dst = Vec::new();

    for &b in literals {
        if has_run[usize::from(b)] {
            let len = read_itf8(lens).and_then(|n| {
                usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })?;

            dst.resize(dst.len() + len + 1, b);
        } else {
            dst.push(b);
        }
    }

    Ok(dst)
}

impl PartialEq for Byte {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (
                Self::External {
                    block_content_id: a,
                },
                Self::External {
                    block_content_id: b,
                },
            ) => a == b,
            (
                Self::Huffman {
                    alphabet: a1,
                    bit_lens: a2,
                    ..
                },
                Self::Huffman {
                    alphabet: b1,
                    bit_lens: b2,
                    ..
                },
            ) => a1 == b1 && a2 == b2,
            (
                Self::Pack {
                    bit_width: a1,
                    value_map: a2,
                    sub_encoding: a3,
                    ..
                },
                Self::Pack {
                    bit_width: b1,
                    value_map: b2,
                    sub_encoding: b3,
                    ..
                },
            ) => a1 == b1 && a2 == b2 && a3 == b3,
            (
                Self::Rle {
                    run_symbols: a1,
                    len_block_content_id: a2,
                    value_encoding: a3,
                    ..
                },
                Self::Rle {
                    run_symbols: b1,
                    len_block_content_id: b2,
                    value_encoding: b3,
                    ..
                },
            ) => a1 == b1 && a2 == b2 && a3 == b3,
            _ => false,
        }
    }
}

impl Eq for Byte {}

impl<'de> Decode<'de> for Byte {
    type Value = u8;

    fn decode(
        &self,
        core_data_reader: &mut BitReader<'de>,
        external_data_readers: &mut ExternalDataReaders<'de>,
    ) -> io::Result<Self::Value> {
        match self {
            Self::Null => Err(null_codec_error()),
            Self::External { block_content_id } => {
                let src = external_data_readers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                let Some((b, rest)) = src.split_first() else {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
                };

                *src = rest;

                Ok(*b)
            }
            Self::Huffman {
                alphabet, decoder, ..
            } => {
                let n = if alphabet.len() == 1 {
                    alphabet[0]
                } else {
                    decoder.decode(core_data_reader)?
                };

                u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            Self::Pack { .. } | Self::Rle { .. } => {
                let series = self.expanded(external_data_readers)?;
                series.read_u8()
            }
        }
    }
}

impl Encode for Byte {
    type Value = u8;

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()> {
        match self {
            Self::Null => Err(null_codec_error()),
            Self::External { block_content_id } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                dst.push(value);

                Ok(())
            }
            Self::Huffman {
                alphabet, encoder, ..
            } => {
                if alphabet.len() == 1 {
                    Ok(())
                } else {
                    encoder.encode(core_data_writer, i32::from(value))
                }
            }
            Self::Pack { .. } | Self::Rle { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "transform codecs do not support encoding",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_external() -> io::Result<()> {
        let encoding = Encoding::new(Byte::External {
            block_content_id: 1,
        });

        let external_data = [0x41, 0x42];
        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(1, &external_data[..]);

        let core_data = [];
        let mut core_data_reader = BitReader::new(&core_data[..]);

        assert_eq!(
            encoding.decode(&mut core_data_reader, &mut external_data_readers)?,
            0x41
        );
        assert_eq!(
            encoding.decode(&mut core_data_reader, &mut external_data_readers)?,
            0x42
        );
        assert!(
            encoding
                .decode(&mut core_data_reader, &mut external_data_readers)
                .is_err()
        );

        Ok(())
    }

    #[test]
    fn test_decode_pack() -> io::Result<()> {
        // 2-bit codes 0..3 mapped to ACGT, packed MSB first.
        let encoding = Encoding::new(Byte::Pack {
            codec_id: 0,
            bit_width: 2,
            value_map: b"ACGT".to_vec(),
            sub_encoding: Box::new(Encoding::new(Byte::External {
                block_content_id: 1,
            })),
        });

        let external_data = [0b00011011];
        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(1, &external_data[..]);

        let core_data = [];
        let mut core_data_reader = BitReader::new(&core_data[..]);

        let mut dst = Vec::new();
        encoding.get().decode_exact(
            &mut core_data_reader,
            &mut external_data_readers,
            &mut dst,
            4,
        )?;

        assert_eq!(dst, b"ACGT");

        Ok(())
    }

    #[test]
    fn test_decode_rle() -> io::Result<()> {
        // Literal stream "ab" where 'a' carries a run length of 2 (3 copies).
        let encoding = Encoding::new(Byte::Rle {
            codec_id: 0,
            run_symbols: vec![b'a'],
            len_block_content_id: 2,
            value_encoding: Box::new(Encoding::new(Byte::External {
                block_content_id: 1,
            })),
        });

        let literals = b"ab";
        let lens = [0x02];

        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(1, &literals[..]);
        external_data_readers.insert(2, &lens[..]);

        let core_data = [];
        let mut core_data_reader = BitReader::new(&core_data[..]);

        let mut dst = Vec::new();
        encoding.get().decode_exact(
            &mut core_data_reader,
            &mut external_data_readers,
            &mut dst,
            4,
        )?;

        assert_eq!(dst, b"aaab");

        Ok(())
    }
}
