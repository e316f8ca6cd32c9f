//! CRAM reader options.

use ramune_core::Position;

/// A query range over one reference sequence.
///
/// Containers and slices that fall entirely outside the range are skipped
/// without decoding; records that do not overlap it are dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Range {
    pub(crate) reference_sequence_id: usize,
    pub(crate) start: Position,
    pub(crate) end: Position,
}

impl Range {
    /// Creates a query range with a 1-based inclusive interval.
    pub fn new(reference_sequence_id: usize, start: Position, end: Position) -> Self {
        Self {
            reference_sequence_id,
            start,
            end,
        }
    }
}

bitflags::bitflags! {
    /// The record fields the caller needs decoded.
    ///
    /// Data series whose fields are not required are skipped, and external
    /// blocks only they reference are left compressed.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct RequiredFields: u16 {
        /// The read name.
        const NAME = 1 << 0;
        /// The BAM flags.
        const FLAGS = 1 << 1;
        /// The reference sequence id.
        const REFERENCE_SEQUENCE_ID = 1 << 2;
        /// The alignment start.
        const ALIGNMENT_START = 1 << 3;
        /// The mapping quality.
        const MAPPING_QUALITY = 1 << 4;
        /// The CIGAR operations.
        const CIGAR = 1 << 5;
        /// The mate reference sequence id.
        const MATE_REFERENCE_SEQUENCE_ID = 1 << 6;
        /// The mate alignment start.
        const MATE_ALIGNMENT_START = 1 << 7;
        /// The template length.
        const TEMPLATE_LENGTH = 1 << 8;
        /// The sequence.
        const SEQUENCE = 1 << 9;
        /// The quality scores.
        const QUALITY_SCORES = 1 << 10;
        /// The auxiliary data.
        const DATA = 1 << 11;
        /// The read group.
        const READ_GROUP = 1 << 12;
    }
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self::all()
    }
}

/// CRAM reader options.
#[derive(Clone, Debug)]
pub(crate) struct Options {
    pub(crate) required_fields: RequiredFields,
    pub(crate) decode_md: bool,
    pub(crate) ignore_reference_md5: bool,
    pub(crate) range: Option<Range>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            required_fields: RequiredFields::default(),
            decode_md: false,
            ignore_reference_md5: false,
            range: None,
        }
    }
}
