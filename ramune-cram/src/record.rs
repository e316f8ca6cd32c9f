//! CRAM record.

pub(crate) mod feature;
mod flags;
mod mate_flags;

pub(crate) use self::{feature::Feature, flags::Flags, mate_flags::MateFlags};

use bstr::{BStr, BString};
use ramune_core::Position;
use ramune_sam::cigar::Op;

/// A CRAM record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub(crate) bam_flags: ramune_sam::Flags,
    pub(crate) cram_flags: Flags,
    pub(crate) reference_sequence_id: Option<usize>,
    pub(crate) read_length: usize,
    pub(crate) alignment_start: Option<Position>,
    pub(crate) alignment_end: Option<Position>,
    pub(crate) read_group_id: Option<usize>,
    pub(crate) name: Option<BString>,
    pub(crate) mate_flags: MateFlags,
    pub(crate) mate_reference_sequence_id: Option<usize>,
    pub(crate) mate_alignment_start: Option<Position>,
    pub(crate) template_length: i32,
    pub(crate) explicit_template_length: Option<i32>,
    pub(crate) mate_distance: Option<usize>,
    pub(crate) mapping_quality: u8,
    pub(crate) cigar: Vec<Op>,
    pub(crate) sequence: Vec<u8>,
    pub(crate) quality_scores: Vec<u8>,
    pub(crate) data: Vec<u8>,
}

impl Record {
    /// Returns the BAM flags.
    pub fn bam_flags(&self) -> ramune_sam::Flags {
        self.bam_flags
    }

    /// Returns the reference sequence id.
    pub fn reference_sequence_id(&self) -> Option<usize> {
        self.reference_sequence_id
    }

    /// Returns the read length.
    pub fn read_length(&self) -> usize {
        self.read_length
    }

    /// Returns the 1-based alignment start.
    pub fn alignment_start(&self) -> Option<Position> {
        self.alignment_start
    }

    /// Returns the 1-based inclusive alignment end.
    pub fn alignment_end(&self) -> Option<Position> {
        self.alignment_end
    }

    /// Returns the read group id.
    pub fn read_group_id(&self) -> Option<usize> {
        self.read_group_id
    }

    /// Returns the read name.
    pub fn name(&self) -> Option<&BStr> {
        self.name.as_ref().map(|name| name.as_ref())
    }

    /// Returns the mate reference sequence id.
    pub fn mate_reference_sequence_id(&self) -> Option<usize> {
        self.mate_reference_sequence_id
    }

    /// Returns the 1-based mate alignment start.
    pub fn mate_alignment_start(&self) -> Option<Position> {
        self.mate_alignment_start
    }

    /// Returns the template length.
    pub fn template_length(&self) -> i32 {
        self.template_length
    }

    /// Returns the mapping quality.
    pub fn mapping_quality(&self) -> u8 {
        self.mapping_quality
    }

    /// Returns the CIGAR operations.
    pub fn cigar(&self) -> &[Op] {
        &self.cigar
    }

    /// Returns the sequence as base characters.
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns the quality scores.
    pub fn quality_scores(&self) -> &[u8] {
        &self.quality_scores
    }

    /// Returns the auxiliary data as raw BAM-encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts this record into its BAM record block representation.
    pub fn into_bam_record(self) -> ramune_bam::Record {
        let mut record = ramune_bam::Record::default();

        *record.name_mut() = self.name.filter(|name| name.as_slice() != b"*");
        *record.flags_mut() = self.bam_flags;
        *record.reference_sequence_id_mut() = self.reference_sequence_id;
        *record.alignment_start_mut() = self.alignment_start;
        *record.mapping_quality_mut() = self.mapping_quality;
        *record.cigar_mut() = self.cigar;
        *record.mate_reference_sequence_id_mut() = self.mate_reference_sequence_id;
        *record.mate_alignment_start_mut() = self.mate_alignment_start;
        *record.template_length_mut() = self.template_length;
        *record.sequence_mut() = self.sequence;
        *record.quality_scores_mut() = self.quality_scores;
        *record.data_mut() = self.data;

        record
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            bam_flags: ramune_sam::Flags::UNMAPPED,
            cram_flags: Flags::empty(),
            reference_sequence_id: None,
            read_length: 0,
            alignment_start: None,
            alignment_end: None,
            read_group_id: None,
            name: None,
            mate_flags: MateFlags::empty(),
            mate_reference_sequence_id: None,
            mate_alignment_start: None,
            template_length: 0,
            explicit_template_length: None,
            mate_distance: None,
            mapping_quality: ramune_bam::record::MISSING_MAPPING_QUALITY,
            cigar: Vec::new(),
            sequence: Vec::new(),
            quality_scores: Vec::new(),
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bstr::ByteSlice;

    use super::*;

    #[test]
    fn test_default() {
        let record = Record::default();
        assert!(record.bam_flags().is_unmapped());
        assert!(record.name().is_none());
        assert!(record.sequence().is_empty());
    }

    #[test]
    fn test_into_bam_record() {
        let mut record = Record::default();
        record.name = Some(BString::from("r0"));
        record.sequence = b"ACGT".to_vec();
        record.read_length = 4;

        let bam_record = record.into_bam_record();
        assert_eq!(bam_record.name().map(|name| name.as_bytes()), Some(&b"r0"[..]));
        assert_eq!(bam_record.sequence(), b"ACGT");
    }
}
