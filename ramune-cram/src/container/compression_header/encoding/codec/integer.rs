use std::io;

use crate::{
    container::{
        block,
        compression_header::encoding::{Decode, Encode, missing_external_block, null_codec_error},
    },
    huffman::{CanonicalHuffmanDecoder, CanonicalHuffmanEncoder},
    io::{
        BitReader, BitWriter,
        reader::{container::slice::records::ExternalDataReaders, num::read_itf8},
        writer::{container::slice::records::ExternalDataWriters, num::write_itf8},
    },
};

/// An integer codec.
#[derive(Clone, Debug)]
pub(crate) enum Integer {
    Null,
    External {
        block_content_id: block::ContentId,
    },
    Golomb {
        offset: i32,
        m: i32,
    },
    Huffman {
        alphabet: Vec<i32>,
        bit_lens: Vec<u32>,
        decoder: CanonicalHuffmanDecoder,
        encoder: CanonicalHuffmanEncoder,
    },
    Beta {
        offset: i32,
        len: u32,
    },
    Subexp {
        offset: i32,
        k: i32,
    },
    GolombRice {
        offset: i32,
        log2_m: i32,
    },
    Gamma {
        offset: i32,
    },
}

impl Integer {
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
}

impl PartialEq for Integer {
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
            (Self::Golomb { offset: a1, m: a2 }, Self::Golomb { offset: b1, m: b2 }) => {
                a1 == b1 && a2 == b2
            }
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
                Self::Beta {
                    offset: a1,
                    len: a2,
                },
                Self::Beta {
                    offset: b1,
                    len: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (Self::Subexp { offset: a1, k: a2 }, Self::Subexp { offset: b1, k: b2 }) => {
                a1 == b1 && a2 == b2
            }
            (
                Self::GolombRice {
                    offset: a1,
                    log2_m: a2,
                },
                Self::GolombRice {
                    offset: b1,
                    log2_m: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (Self::Gamma { offset: a }, Self::Gamma { offset: b }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Integer {}

impl<'de> Decode<'de> for Integer {
    type Value = i32;

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

                read_itf8(src)
            }
            Self::Golomb { offset, m } => {
                if *m <= 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid Golomb parameter: m = {m}"),
                    ));
                }

                let q = core_data_reader.read_zero_run()? as i32;
                let b = 32 - (*m - 1).leading_zeros();

                let value = if b == 0 {
                    q
                } else {
                    let r = core_data_reader.read_i32(b - 1)?;
                    let threshold = (1i32 << b) - m;

                    if r < threshold {
                        q * m + r
                    } else {
                        let r = (r << 1) | core_data_reader.read_i32(1)?;
                        q * m + r - threshold
                    }
                };

                Ok(value - offset)
            }
            Self::Huffman {
                alphabet, decoder, ..
            } => {
                if alphabet.len() == 1 {
                    Ok(alphabet[0])
                } else {
                    decoder.decode(core_data_reader)
                }
            }
            Self::Beta { offset, len } => {
                core_data_reader.read_i32(*len).map(|n| n - offset)
            }
            Self::Subexp { offset, k } => {
                if *k < 0 || *k >= 32 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid subexponential parameter: k = {k}"),
                    ));
                }

                let k = *k as u32;
                let i = core_data_reader.read_one_run()?;

                let value = if i == 0 {
                    core_data_reader.read_u32(k)?
                } else {
                    let n = k + i - 1;

                    if n >= 32 {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "subexponential value overflow",
                        ));
                    }

                    core_data_reader.read_u32(n)? + (1 << n)
                };

                Ok(value as i32 - offset)
            }
            Self::GolombRice { offset, log2_m } => {
                if *log2_m < 0 || *log2_m >= 32 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid Golomb-Rice parameter: log2(m) = {log2_m}"),
                    ));
                }

                let q = core_data_reader.read_zero_run()? as i32;
                let r = core_data_reader.read_i32(*log2_m as u32)?;

                Ok(((q << *log2_m) | r) - offset)
            }
            Self::Gamma { offset } => {
                let n = core_data_reader.read_zero_run()?;
                let m = core_data_reader.read_i32(n)?;
                let x = (1 << n) + m;

                Ok(x - offset)
            }
        }
    }
}

impl Encode for Integer {
    type Value = i32;

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

                write_itf8(dst, value)
            }
            Self::Huffman {
                alphabet, encoder, ..
            } => {
                if alphabet.len() == 1 {
                    Ok(())
                } else {
                    encoder.encode(core_data_writer, value)
                }
            }
            Self::Beta { offset, len } => {
                core_data_writer.write_u32((value + offset) as u32, *len as usize)
            }
            Self::Gamma { offset } => {
                let x = value + offset;

                if x < 1 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Elias gamma requires a positive value: {x}"),
                    ));
                }

                let n = 31 - (x as u32).leading_zeros();

                for _ in 0..n {
                    core_data_writer.write_u32(0, 1)?;
                }
                core_data_writer.write_u32(1, 1)?;

                core_data_writer.write_u32((x - (1 << n)) as u32, n as usize)
            }
            Self::Subexp { offset, k } => {
                if *k < 0 || *k >= 32 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid subexponential parameter: k = {k}"),
                    ));
                }

                let k = *k as u32;
                let n = value + offset;

                if n < 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("subexponential requires a non-negative value: {n}"),
                    ));
                }

                let n = n as u32;

                if n < (1 << k) {
                    core_data_writer.write_u32(0, 1)?;
                    core_data_writer.write_u32(n, k as usize)
                } else {
                    // n is in [2^(k+i-1), 2^(k+i)) for i >= 1.
                    let b = 32 - n.leading_zeros();
                    let i = b - k;

                    for _ in 0..i {
                        core_data_writer.write_u32(1, 1)?;
                    }
                    core_data_writer.write_u32(0, 1)?;

                    core_data_writer.write_u32(n - (1 << (b - 1)), (b - 1) as usize)
                }
            }
            Self::Golomb { offset, m } => {
                if *m <= 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid Golomb parameter: m = {m}"),
                    ));
                }

                let n = value + offset;

                if n < 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Golomb requires a non-negative value: {n}"),
                    ));
                }

                let q = n / m;
                let r = n % m;

                for _ in 0..q {
                    core_data_writer.write_u32(0, 1)?;
                }
                core_data_writer.write_u32(1, 1)?;

                let b = 32 - (*m - 1).leading_zeros();

                if b > 0 {
                    let threshold = (1i32 << b) - m;

                    if r < threshold {
                        core_data_writer.write_u32(r as u32, (b - 1) as usize)?;
                    } else {
                        core_data_writer.write_u32((r + threshold) as u32, b as usize)?;
                    }
                }

                Ok(())
            }
            Self::GolombRice { offset, log2_m } => {
                if *log2_m < 0 || *log2_m >= 32 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid Golomb-Rice parameter: log2(m) = {log2_m}"),
                    ));
                }

                let n = value + offset;

                if n < 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Golomb-Rice requires a non-negative value: {n}"),
                    ));
                }

                let log2_m = *log2_m as u32;
                let q = n >> log2_m;
                let r = n & ((1 << log2_m) - 1);

                for _ in 0..q {
                    core_data_writer.write_u32(0, 1)?;
                }
                core_data_writer.write_u32(1, 1)?;

                core_data_writer.write_u32(r as u32, log2_m as usize)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::compression_header::Encoding;

    fn decode_one(
        core_data: &[u8],
        external_data: &[u8],
        encoding: &Encoding<Integer>,
    ) -> io::Result<i32> {
        let mut core_data_reader = BitReader::new(core_data);

        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(1, external_data);

        encoding.decode(&mut core_data_reader, &mut external_data_readers)
    }

    #[test]
    fn test_decode_external() -> io::Result<()> {
        let encoding = Encoding::new(Integer::External {
            block_content_id: 1,
        });

        assert_eq!(decode_one(&[], &[0x0d], &encoding)?, 13);

        Ok(())
    }

    #[test]
    fn test_decode_huffman_with_single_symbol() -> io::Result<()> {
        // A single-symbol code book consumes no bits.
        let encoding = Encoding::new(Integer::huffman(vec![0x4e], vec![0]));
        assert_eq!(decode_one(&[], &[], &encoding)?, 0x4e);
        Ok(())
    }

    #[test]
    fn test_decode_beta() -> io::Result<()> {
        let encoding = Encoding::new(Integer::Beta { offset: 1, len: 3 });
        assert_eq!(decode_one(&[0b10000000], &[], &encoding)?, 3);

        // A zero-width beta always yields the negated offset.
        let encoding = Encoding::new(Integer::Beta { offset: 8, len: 0 });
        assert_eq!(decode_one(&[], &[], &encoding)?, -8);

        Ok(())
    }

    #[test]
    fn test_decode_gamma() -> io::Result<()> {
        // bits: 000 1 101 => n = 3, m = 0b101, x = 8 + 5 = 13
        let encoding = Encoding::new(Integer::Gamma { offset: 5 });
        assert_eq!(decode_one(&[0b00011010], &[], &encoding)?, 8);
        Ok(())
    }

    #[test]
    fn test_decode_subexp() -> io::Result<()> {
        // i = 0: read k = 2 bits: 0b11 = 3
        let encoding = Encoding::new(Integer::Subexp { offset: 0, k: 2 });
        assert_eq!(decode_one(&[0b01100000], &[], &encoding)?, 3);

        // i = 2: read k + i - 1 = 3 bits: 0b010 = 2, value = 2 + 8 = 10
        let encoding = Encoding::new(Integer::Subexp { offset: 0, k: 2 });
        assert_eq!(decode_one(&[0b11001000], &[], &encoding)?, 10);

        Ok(())
    }

    #[test]
    fn test_decode_golomb() -> io::Result<()> {
        // m = 5: b = 3, threshold = 3
        // bits: 001 01 => q = 2, r = 1 < 3, value = 2 * 5 + 1 = 11
        let encoding = Encoding::new(Integer::Golomb { offset: 0, m: 5 });
        assert_eq!(decode_one(&[0b00101000], &[], &encoding)?, 11);

        // bits: 1 11 0 => q = 0, r = 3 >= 3, r' = 6, value = 6 - 3 = 3
        let encoding = Encoding::new(Integer::Golomb { offset: 0, m: 5 });
        assert_eq!(decode_one(&[0b11100000], &[], &encoding)?, 3);

        Ok(())
    }

    #[test]
    fn test_decode_golomb_rice() -> io::Result<()> {
        // log2(m) = 3: bits: 001 101 => q = 2, r = 5, value = 21
        let encoding = Encoding::new(Integer::GolombRice {
            offset: 0,
            log2_m: 3,
        });
        assert_eq!(decode_one(&[0b00110100], &[], &encoding)?, 21);
        Ok(())
    }

    #[test]
    fn test_decode_null() {
        let encoding = Encoding::new(Integer::Null);
        assert!(decode_one(&[], &[], &encoding).is_err());
    }

    #[test]
    fn test_encode_external() -> io::Result<()> {
        let encoding = Encoding::new(Integer::External {
            block_content_id: 1,
        });

        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers = ExternalDataWriters::default();
        external_data_writers.insert(1, Vec::new());

        encoding.encode(&mut core_data_writer, &mut external_data_writers, 0x0d)?;

        assert!(core_data_writer.finish()?.is_empty());
        assert_eq!(external_data_writers[&1], [0x0d]);

        Ok(())
    }

    #[test]
    fn test_bit_codec_round_trips() -> io::Result<()> {
        fn t(codec: Integer, values: &[i32]) -> io::Result<()> {
            let encoding = Encoding::new(codec);

            let mut core_data_writer = BitWriter::default();
            let mut external_data_writers = ExternalDataWriters::default();

            for &value in values {
                encoding.encode(&mut core_data_writer, &mut external_data_writers, value)?;
            }

            let core_data = core_data_writer.finish()?;
            let mut core_data_reader = BitReader::new(&core_data[..]);
            let mut external_data_readers = ExternalDataReaders::new();

            for &expected in values {
                let actual =
                    encoding.decode(&mut core_data_reader, &mut external_data_readers)?;
                assert_eq!(actual, expected, "codec = {:?}", encoding.get());
            }

            Ok(())
        }

        t(Integer::Beta { offset: 0, len: 8 }, &[0, 1, 13, 255])?;
        t(Integer::Beta { offset: 10, len: 4 }, &[-10, -3, 5])?;
        t(Integer::Gamma { offset: 1 }, &[0, 1, 2, 13, 1000])?;
        t(Integer::Subexp { offset: 0, k: 2 }, &[0, 1, 3, 4, 13, 255, 4096])?;
        t(Integer::Golomb { offset: 0, m: 5 }, &[0, 1, 4, 5, 11, 100])?;
        t(Integer::Golomb { offset: 0, m: 1 }, &[0, 1, 3])?;
        t(
            Integer::GolombRice {
                offset: 0,
                log2_m: 3,
            },
            &[0, 7, 8, 21, 100],
        )?;
        t(
            Integer::huffman(vec![2, 3, 5, 8], vec![1, 2, 3, 3]),
            &[2, 3, 5, 8, 8, 2],
        )?;

        Ok(())
    }
}
