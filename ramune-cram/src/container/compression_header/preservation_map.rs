//! CRAM container compression header preservation map.

pub(crate) mod key;
pub(crate) mod substitution_matrix;
pub(crate) mod tag_sets;

pub(crate) use self::{key::Key, substitution_matrix::SubstitutionMatrix, tag_sets::TagSets};

/// Per-container settings controlling what is preserved verbatim and what is
/// recomputed at decode time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PreservationMap {
    pub(crate) records_have_names: bool,
    pub(crate) alignment_starts_are_deltas: bool,
    pub(crate) reference_required: bool,
    // false = quality scores are stored in sequencing orientation and need
    // reversal for reverse-complemented records.
    pub(crate) quality_scores_use_reference_orientation: bool,
    pub(crate) substitution_matrix: SubstitutionMatrix,
    pub(crate) tag_sets: TagSets,
}

impl PreservationMap {
    pub fn records_have_names(&self) -> bool {
        self.records_have_names
    }

    pub fn alignment_starts_are_deltas(&self) -> bool {
        self.alignment_starts_are_deltas
    }

    pub fn reference_required(&self) -> bool {
        self.reference_required
    }

    pub fn quality_scores_use_reference_orientation(&self) -> bool {
        self.quality_scores_use_reference_orientation
    }

    pub fn substitution_matrix(&self) -> &SubstitutionMatrix {
        &self.substitution_matrix
    }

    pub fn tag_sets(&self) -> &TagSets {
        &self.tag_sets
    }
}

impl Default for PreservationMap {
    fn default() -> Self {
        Self {
            records_have_names: true,
            alignment_starts_are_deltas: true,
            reference_required: true,
            quality_scores_use_reference_orientation: true,
            substitution_matrix: SubstitutionMatrix::default(),
            tag_sets: TagSets::default(),
        }
    }
}
