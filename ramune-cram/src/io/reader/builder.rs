use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use super::{Options, Reader, RequiredFields};
use crate::reference::Repository;

/// A CRAM reader builder.
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

    /// Sets the fields the caller needs decoded.
    pub fn set_required_fields(mut self, required_fields: RequiredFields) -> Self {
        self.options.required_fields = required_fields;
        self
    }

    /// Enables MD/NM auxiliary tag generation from the reference.
    pub fn set_decode_md(mut self, decode_md: bool) -> Self {
        self.options.decode_md = decode_md;
        self
    }

    /// Skips reference MD5 checksum validation.
    pub fn set_ignore_reference_md5(mut self, ignore_reference_md5: bool) -> Self {
        self.options.ignore_reference_md5 = ignore_reference_md5;
        self
    }

    /// Restricts reading to records overlapping the given range.
    pub fn set_range(mut self, range: super::options::Range) -> Self {
        self.options.range = Some(range);
        self
    }

    /// Builds a CRAM reader from a path.
    pub fn build_from_path<P>(self, src: P) -> io::Result<Reader<BufReader<File>>>
    where
        P: AsRef<Path>,
    {
        File::open(src)
            .map(BufReader::new)
            .map(|inner| self.build_from_reader(inner))
    }

    /// Builds a CRAM reader from an underlying reader.
    pub fn build_from_reader<R>(self, inner: R) -> Reader<R>
    where
        R: Read,
    {
        Reader::from_parts(inner, self.reference_sequence_repository, self.options)
    }
}
