//! An alignment record.

use bstr::{BStr, BString};
use ramune_core::Position;
use ramune_sam::{Flags, cigar::Op};

/// A mapping quality value meaning the mapping quality is missing.
pub const MISSING_MAPPING_QUALITY: u8 = 255;

/// An alignment record with owned fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub(crate) name: Option<BString>,
    pub(crate) flags: Flags,
    pub(crate) reference_sequence_id: Option<usize>,
    pub(crate) alignment_start: Option<Position>,
    pub(crate) mapping_quality: u8,
    pub(crate) cigar: Vec<Op>,
    pub(crate) mate_reference_sequence_id: Option<usize>,
    pub(crate) mate_alignment_start: Option<Position>,
    pub(crate) template_length: i32,
    pub(crate) sequence: Vec<u8>,
    pub(crate) quality_scores: Vec<u8>,
    pub(crate) data: Vec<u8>,
}

impl Record {
    /// Returns the read name, if present.
    pub fn name(&self) -> Option<&BStr> {
        self.name.as_ref().map(|name| name.as_ref())
    }

    /// Returns a mutable reference to the read name.
    pub fn name_mut(&mut self) -> &mut Option<BString> {
        &mut self.name
    }

    /// Returns the flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Returns a mutable reference to the flags.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Returns the reference sequence id, if mapped to one.
    pub fn reference_sequence_id(&self) -> Option<usize> {
        self.reference_sequence_id
    }

    /// Returns a mutable reference to the reference sequence id.
    pub fn reference_sequence_id_mut(&mut self) -> &mut Option<usize> {
        &mut self.reference_sequence_id
    }

    /// Returns the 1-based alignment start, if placed.
    pub fn alignment_start(&self) -> Option<Position> {
        self.alignment_start
    }

    /// Returns a mutable reference to the alignment start.
    pub fn alignment_start_mut(&mut self) -> &mut Option<Position> {
        &mut self.alignment_start
    }

    /// Returns the 1-based exclusive alignment end.
    ///
    /// This is the start plus the number of reference bases the CIGAR
    /// consumes.
    pub fn alignment_end(&self) -> Option<Position> {
        self.alignment_start.and_then(|start| {
            let span = ramune_sam::cigar::alignment_span(&self.cigar);
            start.checked_add(span.saturating_sub(1))
        })
    }

    /// Returns the mapping quality, or [`MISSING_MAPPING_QUALITY`].
    pub fn mapping_quality(&self) -> u8 {
        self.mapping_quality
    }

    /// Returns a mutable reference to the mapping quality.
    pub fn mapping_quality_mut(&mut self) -> &mut u8 {
        &mut self.mapping_quality
    }

    /// Returns the CIGAR operations.
    pub fn cigar(&self) -> &[Op] {
        &self.cigar
    }

    /// Returns a mutable reference to the CIGAR operations.
    pub fn cigar_mut(&mut self) -> &mut Vec<Op> {
        &mut self.cigar
    }

    /// Returns the mate reference sequence id.
    pub fn mate_reference_sequence_id(&self) -> Option<usize> {
        self.mate_reference_sequence_id
    }

    /// Returns a mutable reference to the mate reference sequence id.
    pub fn mate_reference_sequence_id_mut(&mut self) -> &mut Option<usize> {
        &mut self.mate_reference_sequence_id
    }

    /// Returns the 1-based mate alignment start.
    pub fn mate_alignment_start(&self) -> Option<Position> {
        self.mate_alignment_start
    }

    /// Returns a mutable reference to the mate alignment start.
    pub fn mate_alignment_start_mut(&mut self) -> &mut Option<Position> {
        &mut self.mate_alignment_start
    }

    /// Returns the template length.
    pub fn template_length(&self) -> i32 {
        self.template_length
    }

    /// Returns a mutable reference to the template length.
    pub fn template_length_mut(&mut self) -> &mut i32 {
        &mut self.template_length
    }

    /// Returns the sequence as unpacked base characters.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns a mutable reference to the sequence.
    pub fn sequence_mut(&mut self) -> &mut Vec<u8> {
        &mut self.sequence
    }

    /// Returns the quality scores.
    ///
    /// An empty list means the quality scores are missing.
    pub fn quality_scores(&self) -> &[u8] {
        &self.quality_scores
    }

    /// Returns a mutable reference to the quality scores.
    pub fn quality_scores_mut(&mut self) -> &mut Vec<u8> {
        &mut self.quality_scores
    }

    /// Returns the auxiliary data as raw BAM-encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the auxiliary data.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            name: None,
            flags: Flags::UNMAPPED,
            reference_sequence_id: None,
            alignment_start: None,
            mapping_quality: MISSING_MAPPING_QUALITY,
            cigar: Vec::new(),
            mate_reference_sequence_id: None,
            mate_alignment_start: None,
            template_length: 0,
            sequence: Vec::new(),
            quality_scores: Vec::new(),
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ramune_sam::cigar::op::Kind;

    use super::*;

    #[test]
    fn test_default() {
        let record = Record::default();

        assert!(record.name().is_none());
        assert_eq!(record.flags(), Flags::UNMAPPED);
        assert!(record.reference_sequence_id().is_none());
        assert!(record.alignment_start().is_none());
        assert_eq!(record.mapping_quality(), MISSING_MAPPING_QUALITY);
        assert!(record.cigar().is_empty());
        assert!(record.sequence().is_empty());
        assert!(record.quality_scores().is_empty());
        assert!(record.data().is_empty());
    }

    #[test]
    fn test_alignment_end() {
        let mut record = Record::default();
        *record.flags_mut() = Flags::empty();
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Position::new(8);
        record.cigar_mut().push(Op::new(Kind::Match, 5));

        assert_eq!(record.alignment_end(), Position::new(12));
    }
}
