//! CRAM reader.

mod builder;
pub(crate) mod collections;
pub(crate) mod container;
pub(crate) mod header;
pub(crate) mod num;
pub mod options;
mod records;

pub use self::{
    builder::Builder,
    container::Container,
    options::{Range, RequiredFields},
    records::Records,
};
pub(crate) use self::options::Options;

use std::io::{self, Read};

use ramune_sam as sam;

use self::header::{read_file_definition, read_file_header};
use crate::{FileDefinition, file_definition::Version, reference::Repository};

/// A CRAM reader.
///
/// Reading proceeds through the file definition, the SAM header container,
/// and then a stream of data containers until the EOF container.
pub struct Reader<R> {
    inner: R,
    reference_sequence_repository: Repository,
    options: Options,
    version: Version,
}

impl<R> Reader<R> {
    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwraps and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Reader<R>
where
    R: Read,
{
    /// Creates a CRAM reader with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramune_cram::io::Reader;
    /// let data = [];
    /// let reader = Reader::new(&data[..]);
    /// ```
    pub fn new(inner: R) -> Self {
        Builder::default().build_from_reader(inner)
    }

    pub(crate) fn from_parts(
        inner: R,
        reference_sequence_repository: Repository,
        options: Options,
    ) -> Self {
        Self {
            inner,
            reference_sequence_repository,
            options,
            version: Version::default(),
        }
    }

    /// Reads the file definition: the magic number, format version, and
    /// file id.
    ///
    /// The position of the stream is expected to be at the start.
    pub fn read_file_definition(&mut self) -> io::Result<FileDefinition> {
        let file_definition = read_file_definition(&mut self.inner)?;
        self.version = file_definition.version();
        Ok(file_definition)
    }

    /// Reads the SAM header container.
    ///
    /// The position of the stream is expected to be directly after the file
    /// definition.
    pub fn read_file_header(&mut self) -> io::Result<sam::Header> {
        read_file_header(&mut self.inner, self.version)
    }

    /// Reads the next data container.
    ///
    /// This returns the number of bytes in the container body, or 0 at the
    /// EOF container or end of stream.
    pub fn read_container(&mut self, container: &mut Container) -> io::Result<usize> {
        container::read_container(&mut self.inner, container, self.version)
    }

    /// Returns an iterator over the records of all remaining containers.
    ///
    /// The position of the stream is expected to be at the start of a
    /// container.
    pub fn records<'r, 'h>(&'r mut self, header: &'h sam::Header) -> Records<'r, 'h, R> {
        Records::new(self, header)
    }

    pub(crate) fn reference_sequence_repository(&self) -> &Repository {
        &self.reference_sequence_repository
    }

    pub(crate) fn options(&self) -> &Options {
        &self.options
    }
}
