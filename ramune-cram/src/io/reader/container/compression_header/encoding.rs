use std::io;

use crate::{
    container::{
        block,
        compression_header::{
            Encoding,
            encoding::{
                Kind,
                codec::{Byte, ByteArray, Integer},
            },
        },
    },
    file_definition::Version,
    io::reader::{
        collections::read_array,
        num::{read_itf8, read_itf8_as},
    },
};

pub(crate) fn read_byte_encoding(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<Encoding<Byte>> {
    match read_kind(src, version)? {
        Kind::Null => {
            read_array(src)?;
            Ok(Encoding::new(Byte::Null))
        }
        Kind::External => {
            let block_content_id = read_external_codec(src)?;
            Ok(Encoding::new(Byte::External { block_content_id }))
        }
        Kind::Huffman => {
            let (alphabet, bit_lens) = read_huffman_codec(src)?;
            Ok(Encoding::new(Byte::huffman(alphabet, bit_lens)))
        }
        Kind::Pack => read_pack_codec(src, version, codec_ids),
        Kind::Rle => read_rle_codec(src, version, codec_ids),
        kind => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid codec for a byte encoding: {kind:?}"),
        )),
    }
}

pub(crate) fn read_integer_encoding(src: &mut &[u8], version: Version) -> io::Result<Encoding<Integer>> {
    match read_kind(src, version)? {
        Kind::Null => {
            read_array(src)?;
            Ok(Encoding::new(Integer::Null))
        }
        Kind::External => {
            let block_content_id = read_external_codec(src)?;
            Ok(Encoding::new(Integer::External { block_content_id }))
        }
        Kind::Golomb => {
            let (offset, m) = read_two_parameter_codec(src)?;
            Ok(Encoding::new(Integer::Golomb { offset, m }))
        }
        Kind::Huffman => {
            let (alphabet, bit_lens) = read_huffman_codec(src)?;
            Ok(Encoding::new(Integer::huffman(alphabet, bit_lens)))
        }
        Kind::Beta => {
            let mut args = read_array(src)?;
            let offset = read_itf8(&mut args)?;
            let len = read_itf8_as(&mut args)?;
            Ok(Encoding::new(Integer::Beta { offset, len }))
        }
        Kind::Subexp => {
            let (offset, k) = read_two_parameter_codec(src)?;
            Ok(Encoding::new(Integer::Subexp { offset, k }))
        }
        Kind::GolombRice => {
            let (offset, log2_m) = read_two_parameter_codec(src)?;
            Ok(Encoding::new(Integer::GolombRice { offset, log2_m }))
        }
        Kind::Gamma => {
            let mut args = read_array(src)?;
            let offset = read_itf8(&mut args)?;
            Ok(Encoding::new(Integer::Gamma { offset }))
        }
        kind => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid codec for an integer encoding: {kind:?}"),
        )),
    }
}

pub(crate) fn read_byte_array_encoding(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<Encoding<ByteArray>> {
    match read_kind(src, version)? {
        Kind::ByteArrayLength => {
            let mut args = read_array(src)?;

            let len_encoding = read_integer_encoding(&mut args, version)?;
            let value_encoding = read_byte_encoding(&mut args, version, codec_ids)?;

            Ok(Encoding::new(ByteArray::ByteArrayLength {
                len_encoding,
                value_encoding,
            }))
        }
        Kind::ByteArrayStop => {
            let args = read_array(src)?;

            let (stop_byte, mut args) = args
                .split_first()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

            let block_content_id = read_itf8(&mut args)?;

            Ok(Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: *stop_byte,
                block_content_id,
            }))
        }
        kind => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid codec for a byte array encoding: {kind:?}"),
        )),
    }
}

/// Reads and discards a single encoding of any value kind.
///
/// The args block is length-prefixed and self-contained, so kind plus args
/// covers the whole descriptor.
pub(crate) fn consume_any_encoding(src: &mut &[u8], version: Version) -> io::Result<()> {
    read_kind(src, version)?;
    read_array(src)?;
    Ok(())
}

fn read_kind(src: &mut &[u8], version: Version) -> io::Result<Kind> {
    let n = read_itf8(src)?;

    let kind = match n {
        0 => Kind::Null,
        1 => Kind::External,
        2 => Kind::Golomb,
        3 => Kind::Huffman,
        4 => Kind::ByteArrayLength,
        5 => Kind::ByteArrayStop,
        6 => Kind::Beta,
        7 => Kind::Subexp,
        8 => Kind::GolombRice,
        9 => Kind::Gamma,
        45 => Kind::Pack,
        46 => Kind::Rle,
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid encoding kind: {n}"),
            ));
        }
    };

    if matches!(kind, Kind::Pack | Kind::Rle) && version < Version::V3_1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("encoding kind {n} requires CRAM 3.1 or later"),
        ));
    }

    Ok(kind)
}

fn read_external_codec(src: &mut &[u8]) -> io::Result<block::ContentId> {
    let mut args = read_array(src)?;
    read_itf8(&mut args)
}

fn read_two_parameter_codec(src: &mut &[u8]) -> io::Result<(i32, i32)> {
    let mut args = read_array(src)?;

    let a = read_itf8(&mut args)?;
    let b = read_itf8(&mut args)?;

    Ok((a, b))
}

fn read_huffman_codec(src: &mut &[u8]) -> io::Result<(Vec<i32>, Vec<u32>)> {
    let mut args = read_array(src)?;

    let alphabet_len: usize = read_itf8_as(&mut args)?;
    let alphabet = (0..alphabet_len)
        .map(|_| read_itf8(&mut args))
        .collect::<io::Result<_>>()?;

    let bit_lens_len: usize = read_itf8_as(&mut args)?;
    let bit_lens = (0..bit_lens_len)
        .map(|_| read_itf8_as::<_, u32>(&mut args))
        .collect::<io::Result<_>>()?;

    Ok((alphabet, bit_lens))
}

fn read_pack_codec(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<Encoding<Byte>> {
    let mut args = read_array(src)?;

    let bit_width: u32 = read_itf8_as(&mut args)?;

    let value_map_len: usize = read_itf8_as(&mut args)?;
    if value_map_len > 256 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid pack symbol map length",
        ));
    }

    let value_map = (0..value_map_len)
        .map(|_| {
            read_itf8(&mut args).and_then(|n| {
                u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
        })
        .collect::<io::Result<_>>()?;

    let sub_encoding = read_byte_encoding(&mut args, version, codec_ids)?;

    let codec_id = *codec_ids;
    *codec_ids += 1;

    Ok(Encoding::new(Byte::Pack {
        codec_id,
        bit_width,
        value_map,
        sub_encoding: Box::new(sub_encoding),
    }))
}

fn read_rle_codec(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<Encoding<Byte>> {
    let mut args = read_array(src)?;

    let run_symbol_count: usize = read_itf8_as(&mut args)?;
    if run_symbol_count > 256 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid run symbol count",
        ));
    }

    let run_symbols = (0..run_symbol_count)
        .map(|_| {
            read_itf8(&mut args).and_then(|n| {
                u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
        })
        .collect::<io::Result<_>>()?;

    let len_encoding = read_integer_encoding(&mut args, version)?;

    let Integer::External {
        block_content_id: len_block_content_id,
    } = *len_encoding.get()
    else {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "run length sub-encoding must be external",
        ));
    };

    let value_encoding = read_byte_encoding(&mut args, version, codec_ids)?;

    let codec_id = *codec_ids;
    *codec_ids += 1;

    Ok(Encoding::new(Byte::Rle {
        codec_id,
        run_symbols,
        len_block_content_id,
        value_encoding: Box::new(value_encoding),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_kind() -> io::Result<()> {
        fn t(mut src: &[u8], expected: Kind, version: Version) -> io::Result<()> {
            assert_eq!(read_kind(&mut src, version)?, expected);
            Ok(())
        }

        t(&[0x00], Kind::Null, Version::V3_0)?;
        t(&[0x01], Kind::External, Version::V3_0)?;
        t(&[0x02], Kind::Golomb, Version::V3_0)?;
        t(&[0x03], Kind::Huffman, Version::V3_0)?;
        t(&[0x04], Kind::ByteArrayLength, Version::V3_0)?;
        t(&[0x05], Kind::ByteArrayStop, Version::V3_0)?;
        t(&[0x06], Kind::Beta, Version::V3_0)?;
        t(&[0x07], Kind::Subexp, Version::V3_0)?;
        t(&[0x08], Kind::GolombRice, Version::V3_0)?;
        t(&[0x09], Kind::Gamma, Version::V3_0)?;
        t(&[0x2d], Kind::Pack, Version::V3_1)?;
        t(&[0x2e], Kind::Rle, Version::V3_1)?;

        // Unknown kind.
        assert!(matches!(
            read_kind(&mut &[0x0a][..], Version::V3_0),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));

        // Transforms require CRAM 3.1.
        assert!(matches!(
            read_kind(&mut &[0x2d][..], Version::V3_0),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));

        Ok(())
    }

    #[test]
    fn test_read_integer_encoding() -> io::Result<()> {
        // external, args = [block content id = 5]
        let src = [0x01, 0x01, 0x05];
        let encoding = read_integer_encoding(&mut &src[..], Version::V3_0)?;
        assert_eq!(
            encoding,
            Encoding::new(Integer::External {
                block_content_id: 5
            })
        );

        // huffman, args = [1, 65, 1, 0]
        let src = [0x03, 0x04, 0x01, 0x41, 0x01, 0x00];
        let encoding = read_integer_encoding(&mut &src[..], Version::V3_0)?;
        assert_eq!(encoding, Encoding::new(Integer::huffman(vec![65], vec![0])));

        // beta, args = [offset = 0, len = 8]
        let src = [0x06, 0x02, 0x00, 0x08];
        let encoding = read_integer_encoding(&mut &src[..], Version::V3_0)?;
        assert_eq!(encoding, Encoding::new(Integer::Beta { offset: 0, len: 8 }));

        Ok(())
    }

    #[test]
    fn test_read_byte_array_encoding() -> io::Result<()> {
        let mut codec_ids = 0;

        // byte array stop, args = [stop byte = 0, block content id = 8]
        let src = [0x05, 0x02, 0x00, 0x08];
        let encoding = read_byte_array_encoding(&mut &src[..], Version::V3_0, &mut codec_ids)?;
        assert_eq!(
            encoding,
            Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: 8,
            })
        );

        // byte array length, args = [external(13), external(21)]
        let src = [0x04, 0x06, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x15];
        let encoding = read_byte_array_encoding(&mut &src[..], Version::V3_0, &mut codec_ids)?;
        assert_eq!(
            encoding,
            Encoding::new(ByteArray::ByteArrayLength {
                len_encoding: Encoding::new(Integer::External {
                    block_content_id: 13
                }),
                value_encoding: Encoding::new(Byte::External {
                    block_content_id: 21
                }),
            })
        );

        Ok(())
    }

    #[test]
    fn test_read_pack_codec() -> io::Result<()> {
        let mut codec_ids = 0;

        // pack, args = [bit width = 2, map = [65, 67, 71, 84], external(9)]
        let src = [
            0x2d, // kind = pack
            0x09, // args length
            0x02, // bit width
            0x04, // value map length
            0x41, 0x43, 0x47, 0x54, // value map = ACGT
            0x01, 0x01, 0x09, // sub-encoding = external(9)
        ];

        let encoding = read_byte_encoding(&mut &src[..], Version::V3_1, &mut codec_ids)?;

        assert_eq!(
            encoding,
            Encoding::new(Byte::Pack {
                codec_id: 0,
                bit_width: 2,
                value_map: b"ACGT".to_vec(),
                sub_encoding: Box::new(Encoding::new(Byte::External {
                    block_content_id: 9
                })),
            })
        );

        assert_eq!(codec_ids, 1);

        Ok(())
    }

    #[test]
    fn test_read_rle_codec() -> io::Result<()> {
        let mut codec_ids = 0;

        let src = [
            0x2e, // kind = rle
            0x08, // args length
            0x01, // run symbol count
            0x41, // run symbols = [A]
            0x01, 0x01, 0x07, // length sub-encoding = external(7)
            0x01, 0x01, 0x08, // value sub-encoding = external(8)
        ];

        let encoding = read_byte_encoding(&mut &src[..], Version::V3_1, &mut codec_ids)?;

        assert_eq!(
            encoding,
            Encoding::new(Byte::Rle {
                codec_id: 0,
                run_symbols: vec![b'A'],
                len_block_content_id: 7,
                value_encoding: Box::new(Encoding::new(Byte::External {
                    block_content_id: 8
                })),
            })
        );

        Ok(())
    }
}
