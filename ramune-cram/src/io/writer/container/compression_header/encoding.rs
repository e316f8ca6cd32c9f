use std::io::{self, Write};

use crate::{
    container::compression_header::{
        Encoding,
        encoding::{
            Kind,
            codec::{Byte, ByteArray, Integer},
        },
    },
    io::writer::{collections::write_array, num::write_itf8},
};

fn write_kind<W>(writer: &mut W, kind: Kind) -> io::Result<()>
where
    W: Write,
{
    write_itf8(writer, i32::from(kind))
}

fn write_args<W>(writer: &mut W, args: &[u8]) -> io::Result<()>
where
    W: Write,
{
    write_array(writer, args)
}

pub(super) fn write_integer_encoding<W>(
    writer: &mut W,
    encoding: &Encoding<Integer>,
) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        Integer::Null => {
            write_kind(writer, Kind::Null)?;
            write_args(writer, &[])
        }
        Integer::External { block_content_id } => {
            write_kind(writer, Kind::External)?;

            let mut args = Vec::new();
            write_itf8(&mut args, *block_content_id)?;

            write_args(writer, &args)
        }
        Integer::Golomb { offset, m } => {
            write_kind(writer, Kind::Golomb)?;
            write_two_parameter_args(writer, *offset, *m)
        }
        Integer::Huffman {
            alphabet, bit_lens, ..
        } => {
            write_kind(writer, Kind::Huffman)?;
            write_huffman_args(writer, alphabet, bit_lens)
        }
        Integer::Beta { offset, len } => {
            write_kind(writer, Kind::Beta)?;

            let len = i32::try_from(*len)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            write_two_parameter_args(writer, *offset, len)
        }
        Integer::Subexp { offset, k } => {
            write_kind(writer, Kind::Subexp)?;
            write_two_parameter_args(writer, *offset, *k)
        }
        Integer::GolombRice { offset, log2_m } => {
            write_kind(writer, Kind::GolombRice)?;
            write_two_parameter_args(writer, *offset, *log2_m)
        }
        Integer::Gamma { offset } => {
            write_kind(writer, Kind::Gamma)?;

            let mut args = Vec::new();
            write_itf8(&mut args, *offset)?;

            write_args(writer, &args)
        }
    }
}

pub(super) fn write_byte_encoding<W>(writer: &mut W, encoding: &Encoding<Byte>) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        Byte::Null => {
            write_kind(writer, Kind::Null)?;
            write_args(writer, &[])
        }
        Byte::External { block_content_id } => {
            write_kind(writer, Kind::External)?;

            let mut args = Vec::new();
            write_itf8(&mut args, *block_content_id)?;

            write_args(writer, &args)
        }
        Byte::Huffman {
            alphabet, bit_lens, ..
        } => {
            write_kind(writer, Kind::Huffman)?;
            write_huffman_args(writer, alphabet, bit_lens)
        }
        Byte::Pack { .. } | Byte::Rle { .. } => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "transform codecs do not support encoding",
        )),
    }
}

pub(super) fn write_byte_array_encoding<W>(
    writer: &mut W,
    encoding: &Encoding<ByteArray>,
) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        ByteArray::ByteArrayLength {
            len_encoding,
            value_encoding,
        } => {
            write_kind(writer, Kind::ByteArrayLength)?;

            let mut args = Vec::new();
            write_integer_encoding(&mut args, len_encoding)?;
            write_byte_encoding(&mut args, value_encoding)?;

            write_args(writer, &args)
        }
        ByteArray::ByteArrayStop {
            stop_byte,
            block_content_id,
        } => {
            write_kind(writer, Kind::ByteArrayStop)?;

            let mut args = vec![*stop_byte];
            write_itf8(&mut args, *block_content_id)?;

            write_args(writer, &args)
        }
    }
}

fn write_two_parameter_args<W>(writer: &mut W, a: i32, b: i32) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();
    write_itf8(&mut args, a)?;
    write_itf8(&mut args, b)?;

    write_args(writer, &args)
}

fn write_huffman_args<W>(writer: &mut W, alphabet: &[i32], bit_lens: &[u32]) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();

    let alphabet_len = i32::try_from(alphabet.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut args, alphabet_len)?;

    for &symbol in alphabet {
        write_itf8(&mut args, symbol)?;
    }

    let bit_lens_len = i32::try_from(bit_lens.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut args, bit_lens_len)?;

    for &bit_len in bit_lens {
        let n = i32::try_from(bit_len)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_itf8(&mut args, n)?;
    }

    write_args(writer, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file_definition::Version,
        io::reader::container::compression_header::encoding::{
            read_byte_array_encoding, read_integer_encoding,
        },
    };

    #[test]
    fn test_integer_encoding_round_trips() -> io::Result<()> {
        let encodings = [
            Encoding::new(Integer::External {
                block_content_id: 13,
            }),
            Encoding::new(Integer::huffman(vec![8, 13], vec![1, 1])),
            Encoding::new(Integer::Beta { offset: 5, len: 8 }),
            Encoding::new(Integer::Subexp { offset: 0, k: 2 }),
            Encoding::new(Integer::Gamma { offset: 1 }),
            Encoding::new(Integer::Golomb { offset: 0, m: 10 }),
            Encoding::new(Integer::GolombRice {
                offset: 0,
                log2_m: 3,
            }),
        ];

        for expected in encodings {
            let mut buf = Vec::new();
            write_integer_encoding(&mut buf, &expected)?;

            let actual = read_integer_encoding(&mut &buf[..], Version::V3_0)?;
            assert_eq!(actual, expected);
        }

        Ok(())
    }

    #[test]
    fn test_byte_array_encoding_round_trips() -> io::Result<()> {
        let encodings = [
            Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: 7,
            }),
            Encoding::new(ByteArray::ByteArrayLength {
                len_encoding: Encoding::new(Integer::External {
                    block_content_id: 19,
                }),
                value_encoding: Encoding::new(Byte::External {
                    block_content_id: 19,
                }),
            }),
        ];

        for expected in encodings {
            let mut buf = Vec::new();
            write_byte_array_encoding(&mut buf, &expected)?;

            let mut codec_ids = 0;
            let actual =
                read_byte_array_encoding(&mut &buf[..], Version::V3_0, &mut codec_ids)?;
            assert_eq!(actual, expected);
        }

        Ok(())
    }
}
