use std::io;

use super::{Byte, Integer};
use crate::{
    container::{
        block,
        compression_header::encoding::{Decode, Encode, Encoding, missing_external_block},
    },
    io::{
        BitReader, BitWriter,
        reader::container::slice::records::ExternalDataReaders,
        writer::container::slice::records::ExternalDataWriters,
    },
};

/// A byte array codec.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ByteArray {
    /// A length followed by that many bytes, each through its own codec.
    ByteArrayLength {
        len_encoding: Encoding<Integer>,
        value_encoding: Encoding<Byte>,
    },
    /// Bytes up to (and not including) a stop byte.
    ByteArrayStop {
        stop_byte: u8,
        block_content_id: block::ContentId,
    },
}

impl<'de> Decode<'de> for ByteArray {
    type Value = Vec<u8>;

    fn decode(
        &self,
        core_data_reader: &mut BitReader<'de>,
        external_data_readers: &mut ExternalDataReaders<'de>,
    ) -> io::Result<Self::Value> {
        match self {
            Self::ByteArrayLength {
                len_encoding,
                value_encoding,
            } => {
                let len = len_encoding
                    .decode(core_data_reader, external_data_readers)
                    .and_then(|n| {
                        usize::try_from(n)
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
                    })?;

                let mut buf = Vec::with_capacity(len);

                value_encoding.get().decode_exact(
                    core_data_reader,
                    external_data_readers,
                    &mut buf,
                    len,
                )?;

                Ok(buf)
            }
            Self::ByteArrayStop {
                stop_byte,
                block_content_id,
            } => {
                let src = external_data_readers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                let len = memchr::memchr(*stop_byte, src)
                    .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

                let buf = src[..len].to_vec();

                // The stop byte is consumed but not emitted.
                *src = &src[len + 1..];

                Ok(buf)
            }
        }
    }
}

impl Encode for ByteArray {
    type Value = Vec<u8>;

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()> {
        match self {
            Self::ByteArrayLength {
                len_encoding,
                value_encoding,
            } => {
                let len = i32::try_from(value.len())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

                len_encoding.encode(core_data_writer, external_data_writers, len)?;

                value_encoding
                    .get()
                    .encode_exact(core_data_writer, external_data_writers, &value)
            }
            Self::ByteArrayStop {
                stop_byte,
                block_content_id,
            } => {
                if value.contains(stop_byte) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "byte array contains the stop byte",
                    ));
                }

                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_external_block(*block_content_id))?;

                dst.extend_from_slice(&value);
                dst.push(*stop_byte);

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_byte_array_stop() -> io::Result<()> {
        let encoding = Encoding::new(ByteArray::ByteArrayStop {
            stop_byte: 0x09,
            block_content_id: 2,
        });

        let external_data = b"r1\tr2\tr3\t";
        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(2, &external_data[..]);

        let core_data = [];
        let mut core_data_reader = BitReader::new(&core_data[..]);

        for expected in [&b"r1"[..], b"r2", b"r3"] {
            let actual = encoding.decode(&mut core_data_reader, &mut external_data_readers)?;
            assert_eq!(actual, expected);
        }

        Ok(())
    }

    #[test]
    fn test_decode_byte_array_stop_with_missing_stop_byte() {
        let encoding = Encoding::new(ByteArray::ByteArrayStop {
            stop_byte: 0x00,
            block_content_id: 2,
        });

        let external_data = b"r1";
        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(2, &external_data[..]);

        let core_data = [];
        let mut core_data_reader = BitReader::new(&core_data[..]);

        assert!(matches!(
            encoding.decode(&mut core_data_reader, &mut external_data_readers),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof,
        ));
    }

    #[test]
    fn test_byte_array_length_round_trip() -> io::Result<()> {
        let encoding = Encoding::new(ByteArray::ByteArrayLength {
            len_encoding: Encoding::new(Integer::External {
                block_content_id: 1,
            }),
            value_encoding: Encoding::new(Byte::External {
                block_content_id: 2,
            }),
        });

        let values: [&[u8]; 2] = [b"ACGT", b"AC"];

        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers = ExternalDataWriters::default();
        external_data_writers.insert(1, Vec::new());
        external_data_writers.insert(2, Vec::new());

        for value in values {
            encoding.encode(
                &mut core_data_writer,
                &mut external_data_writers,
                value.to_vec(),
            )?;
        }

        let len_data = external_data_writers[&1].clone();
        let value_data = external_data_writers[&2].clone();

        let core_data = core_data_writer.finish()?;
        let mut core_data_reader = BitReader::new(&core_data[..]);

        let mut external_data_readers = ExternalDataReaders::new();
        external_data_readers.insert(1, &len_data[..]);
        external_data_readers.insert(2, &value_data[..]);

        for expected in values {
            let actual = encoding.decode(&mut core_data_reader, &mut external_data_readers)?;
            assert_eq!(actual, expected);
        }

        Ok(())
    }
}
