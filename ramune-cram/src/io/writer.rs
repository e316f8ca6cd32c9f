//! CRAM writer.

mod builder;
pub(crate) mod collections;
pub(crate) mod container;
mod header;
pub(crate) mod num;
pub mod options;

pub use self::builder::Builder;
pub(crate) use self::options::Options;

use std::io::{self, Write};

use ramune_bam as bam;
use ramune_sam as sam;

use self::header::{write_file_definition, write_file_header};
use crate::{file_definition::Version, reference::Repository};

// § 9 "End of file container" (2024-09-04).
const EOF_CONTAINER: [u8; 38] = [
    0x0f, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x0f, 0xe0, 0x45, 0x4f, 0x46, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x05, 0xbd, 0xd9, 0x4f, 0x00, 0x01, 0x00, 0x06, 0x06, 0x01, 0x00,
    0x01, 0x00, 0x01, 0x00, 0xee, 0x63, 0x01, 0x4b,
];

// The 2.x EOF container carries no CRC32 fields.
const EOF_CONTAINER_V2: [u8; 30] = [
    0x0b, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x0f, 0xe0, 0x45, 0x4f, 0x46, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0x06, 0x06, 0x01, 0x00, 0x01, 0x00, 0x01, 0x00,
];

/// A CRAM writer.
///
/// Records are buffered and flushed as whole containers. [`Self::try_finish`]
/// must be called to flush the trailing records and write the EOF container.
pub struct Writer<W> {
    inner: W,
    reference_sequence_repository: Repository,
    options: Options,
    records: Vec<bam::Record>,
    record_counter: u64,
}

impl<W> Writer<W> {
    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Writer<W>
where
    W: Write,
{
    /// Creates a CRAM writer with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramune_cram::io::Writer;
    /// let writer = Writer::new(Vec::new());
    /// ```
    pub fn new(inner: W) -> Self {
        Builder::default().build_from_writer(inner)
    }

    pub(crate) fn from_parts(
        inner: W,
        reference_sequence_repository: Repository,
        options: Options,
    ) -> Self {
        let records = Vec::with_capacity(options.records_per_container());

        Self {
            inner,
            reference_sequence_repository,
            options,
            records,
            record_counter: 0,
        }
    }

    /// Writes the file definition.
    pub fn write_file_definition(&mut self) -> io::Result<()> {
        write_file_definition(&mut self.inner, self.options.version)
    }

    /// Writes the SAM header container.
    pub fn write_file_header(&mut self, header: &sam::Header) -> io::Result<()> {
        write_file_header(&mut self.inner, header, self.options.version)
    }

    /// Buffers a record, flushing a container when one fills.
    pub fn write_record(&mut self, header: &sam::Header, record: bam::Record) -> io::Result<()> {
        self.records.push(record);

        if self.records.len() >= self.options.records_per_container() {
            self.flush(header)?;
        }

        Ok(())
    }

    /// Flushes any buffered records and writes the EOF container.
    pub fn try_finish(&mut self, header: &sam::Header) -> io::Result<()> {
        self.flush(header)?;

        if self.options.version.has_crc32() {
            self.inner.write_all(&EOF_CONTAINER)
        } else {
            self.inner.write_all(&EOF_CONTAINER_V2)
        }
    }

    fn flush(&mut self, header: &sam::Header) -> io::Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }

        let records = std::mem::take(&mut self.records);

        container::write_container(
            &mut self.inner,
            header,
            &self.reference_sequence_repository,
            &self.options,
            &records,
            self.record_counter,
        )?;

        self.record_counter += records.len() as u64;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_finish_writes_the_eof_container() -> io::Result<()> {
        let header = sam::Header::default();

        let mut writer = Writer::new(Vec::new());
        writer.write_file_definition()?;
        writer.try_finish(&header)?;

        let buf = writer.into_inner();
        assert_eq!(&buf[buf.len() - EOF_CONTAINER.len()..], EOF_CONTAINER);

        Ok(())
    }
}
