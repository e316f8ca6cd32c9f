use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use super::{Options, Writer};
use crate::{file_definition::Version, reference::Repository};

/// A CRAM writer builder.
#[derive(Default)]
pub struct Builder {
    reference_sequence_repository: Repository,
    options: Options,
}

impl Builder {
    /// Sets the reference sequence repository.
    pub fn set_reference_sequence_repository(mut self, repository: Repository) -> Self {
        self.reference_sequence_repository = repository;
        self
    }

    /// Sets the format version to write.
    pub fn set_version(mut self, version: Version) -> Self {
        self.options.version = version;
        self
    }

    /// Sets the maximum number of records per slice.
    pub fn set_records_per_slice(mut self, records_per_slice: usize) -> Self {
        self.options.records_per_slice = records_per_slice.max(1);
        self
    }

    /// Sets the number of slices per container.
    pub fn set_slices_per_container(mut self, slices_per_container: usize) -> Self {
        self.options.slices_per_container = slices_per_container.max(1);
        self
    }

    /// Enables or disables bzip2 block compression.
    pub fn set_use_bzip2(mut self, use_bzip2: bool) -> Self {
        self.options.use_bzip2 = use_bzip2;
        self
    }

    /// Enables or disables rANS block compression.
    pub fn set_use_rans(mut self, use_rans: bool) -> Self {
        self.options.use_rans = use_rans;
        self
    }

    /// Enables or disables the tok3 name codec for the read name block.
    ///
    /// This only applies when writing CRAM 3.1.
    pub fn set_use_name_tokenizer(mut self, use_name_tokenizer: bool) -> Self {
        self.options.use_name_tokenizer = use_name_tokenizer;
        self
    }

    /// Builds a CRAM writer to a path.
    pub fn build_from_path<P>(self, dst: P) -> io::Result<Writer<BufWriter<File>>>
    where
        P: AsRef<Path>,
    {
        File::create(dst)
            .map(BufWriter::new)
            .map(|inner| self.build_from_writer(inner))
    }

    /// Builds a CRAM writer to an underlying writer.
    pub fn build_from_writer<W>(self, inner: W) -> Writer<W>
    where
        W: Write,
    {
        Writer::from_parts(inner, self.reference_sequence_repository, self.options)
    }
}
