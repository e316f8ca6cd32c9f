//! CRAM writer options.

use crate::file_definition::Version;

/// CRAM writer options.
#[derive(Clone, Debug)]
pub(crate) struct Options {
    pub(crate) version: Version,
    pub(crate) records_per_slice: usize,
    pub(crate) slices_per_container: usize,
    pub(crate) use_bzip2: bool,
    pub(crate) use_rans: bool,
    pub(crate) use_name_tokenizer: bool,
}

impl Options {
    pub(crate) fn records_per_container(&self) -> usize {
        self.records_per_slice * self.slices_per_container
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            version: Version::default(),
            records_per_slice: 10240,
            slices_per_container: 1,
            use_bzip2: false,
            use_rans: true,
            use_name_tokenizer: false,
        }
    }
}
