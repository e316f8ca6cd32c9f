//! Data series encodings.

pub(crate) mod codec;
pub(crate) mod kind;

pub(crate) use self::kind::Kind;

use std::io;

use crate::io::{
    BitReader, BitWriter, reader::container::slice::records::ExternalDataReaders,
    writer::container::slice::records::ExternalDataWriters,
};

/// Decodes one value of a data series.
pub(crate) trait Decode<'de> {
    type Value;

    fn decode(
        &self,
        core_data_reader: &mut BitReader<'de>,
        external_data_readers: &mut ExternalDataReaders<'de>,
    ) -> io::Result<Self::Value>;
}

/// Encodes one value of a data series.
pub(crate) trait Encode {
    type Value;

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()>;
}

/// An encoding: a codec bound to a data series.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Encoding<C>(C);

impl<C> Encoding<C> {
    pub fn new(codec: C) -> Self {
        Self(codec)
    }

    pub fn get(&self) -> &C {
        &self.0
    }
}

impl<'de, C> Encoding<C>
where
    C: Decode<'de>,
{
    pub fn decode(
        &self,
        core_data_reader: &mut BitReader<'de>,
        external_data_readers: &mut ExternalDataReaders<'de>,
    ) -> io::Result<C::Value> {
        self.0
            .decode(core_data_reader, external_data_readers)
    }
}

impl<C> Encoding<C>
where
    C: Encode,
{
    pub fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: C::Value,
    ) -> io::Result<()> {
        self.0
            .encode(core_data_writer, external_data_writers, value)
    }
}

pub(crate) fn missing_external_block(block_content_id: i32) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("missing external block: {block_content_id}"),
    )
}

pub(crate) fn null_codec_error() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "null codec yields no values")
}
