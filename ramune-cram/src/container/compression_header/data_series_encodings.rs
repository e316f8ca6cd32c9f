//! CRAM container compression header data series encodings.

pub(crate) mod data_series;

pub(crate) use self::data_series::DataSeries;

use std::collections::HashSet;

use super::{
    Encoding,
    encoding::codec::{Byte, ByteArray, Integer},
};
use crate::container::block;

/// The per-data-series codec table.
///
/// A series without an encoding is simply absent from the container; the
/// decoder only errors if a record actually needs it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct DataSeriesEncodings {
    pub(crate) bam_flags: Option<Encoding<Integer>>,
    pub(crate) cram_flags: Option<Encoding<Integer>>,
    pub(crate) reference_sequence_ids: Option<Encoding<Integer>>,
    pub(crate) read_lengths: Option<Encoding<Integer>>,
    pub(crate) alignment_starts: Option<Encoding<Integer>>,
    pub(crate) read_group_ids: Option<Encoding<Integer>>,
    pub(crate) names: Option<Encoding<ByteArray>>,
    pub(crate) mate_flags: Option<Encoding<Integer>>,
    pub(crate) mate_reference_sequence_ids: Option<Encoding<Integer>>,
    pub(crate) mate_alignment_starts: Option<Encoding<Integer>>,
    pub(crate) template_lengths: Option<Encoding<Integer>>,
    pub(crate) mate_distances: Option<Encoding<Integer>>,
    pub(crate) tag_set_ids: Option<Encoding<Integer>>,
    pub(crate) feature_counts: Option<Encoding<Integer>>,
    pub(crate) feature_codes: Option<Encoding<Byte>>,
    pub(crate) feature_position_deltas: Option<Encoding<Integer>>,
    pub(crate) deletion_lengths: Option<Encoding<Integer>>,
    pub(crate) stretches_of_bases: Option<Encoding<ByteArray>>,
    pub(crate) stretches_of_quality_scores: Option<Encoding<ByteArray>>,
    pub(crate) base_substitution_codes: Option<Encoding<Byte>>,
    pub(crate) insertion_bases: Option<Encoding<ByteArray>>,
    pub(crate) reference_skip_lengths: Option<Encoding<Integer>>,
    pub(crate) padding_lengths: Option<Encoding<Integer>>,
    pub(crate) hard_clip_lengths: Option<Encoding<Integer>>,
    pub(crate) soft_clip_bases: Option<Encoding<ByteArray>>,
    pub(crate) mapping_qualities: Option<Encoding<Integer>>,
    pub(crate) bases: Option<Encoding<Byte>>,
    pub(crate) quality_scores: Option<Encoding<Byte>>,
}

macro_rules! getter {
    ($field:ident, $ty:ty) => {
        pub fn $field(&self) -> Option<&Encoding<$ty>> {
            self.$field.as_ref()
        }
    };
}

impl DataSeriesEncodings {
    getter!(bam_flags, Integer);
    getter!(cram_flags, Integer);
    getter!(reference_sequence_ids, Integer);
    getter!(read_lengths, Integer);
    getter!(alignment_starts, Integer);
    getter!(read_group_ids, Integer);
    getter!(names, ByteArray);
    getter!(mate_flags, Integer);
    getter!(mate_reference_sequence_ids, Integer);
    getter!(mate_alignment_starts, Integer);
    getter!(template_lengths, Integer);
    getter!(mate_distances, Integer);
    getter!(tag_set_ids, Integer);
    getter!(feature_counts, Integer);
    getter!(feature_codes, Byte);
    getter!(feature_position_deltas, Integer);
    getter!(deletion_lengths, Integer);
    getter!(stretches_of_bases, ByteArray);
    getter!(stretches_of_quality_scores, ByteArray);
    getter!(base_substitution_codes, Byte);
    getter!(insertion_bases, ByteArray);
    getter!(reference_skip_lengths, Integer);
    getter!(padding_lengths, Integer);
    getter!(hard_clip_lengths, Integer);
    getter!(soft_clip_bases, ByteArray);
    getter!(mapping_qualities, Integer);
    getter!(bases, Byte);
    getter!(quality_scores, Byte);

    /// Builds the default encoding set: every series external, keyed by its
    /// canonical content id.
    pub fn init() -> Self {
        fn external_int(data_series: DataSeries) -> Option<Encoding<Integer>> {
            Some(Encoding::new(Integer::External {
                block_content_id: block::ContentId::from(data_series),
            }))
        }

        fn external_byte(data_series: DataSeries) -> Option<Encoding<Byte>> {
            Some(Encoding::new(Byte::External {
                block_content_id: block::ContentId::from(data_series),
            }))
        }

        fn byte_array_stop(data_series: DataSeries) -> Option<Encoding<ByteArray>> {
            Some(Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: block::ContentId::from(data_series),
            }))
        }

        Self {
            bam_flags: external_int(DataSeries::BamFlags),
            cram_flags: external_int(DataSeries::CramFlags),
            reference_sequence_ids: external_int(DataSeries::ReferenceSequenceIds),
            read_lengths: external_int(DataSeries::ReadLengths),
            alignment_starts: external_int(DataSeries::AlignmentStarts),
            read_group_ids: external_int(DataSeries::ReadGroupIds),
            names: byte_array_stop(DataSeries::Names),
            mate_flags: external_int(DataSeries::MateFlags),
            mate_reference_sequence_ids: external_int(DataSeries::MateReferenceSequenceIds),
            mate_alignment_starts: external_int(DataSeries::MateAlignmentStarts),
            template_lengths: external_int(DataSeries::TemplateLengths),
            mate_distances: external_int(DataSeries::MateDistances),
            tag_set_ids: external_int(DataSeries::TagSetIds),
            feature_counts: external_int(DataSeries::FeatureCounts),
            feature_codes: external_byte(DataSeries::FeatureCodes),
            feature_position_deltas: external_int(DataSeries::FeaturePositionDeltas),
            deletion_lengths: external_int(DataSeries::DeletionLengths),
            stretches_of_bases: byte_array_stop(DataSeries::StretchesOfBases),
            stretches_of_quality_scores: Some(Encoding::new(ByteArray::ByteArrayLength {
                len_encoding: Encoding::new(Integer::External {
                    block_content_id: block::ContentId::from(
                        DataSeries::StretchesOfQualityScores,
                    ),
                }),
                value_encoding: Encoding::new(Byte::External {
                    block_content_id: block::ContentId::from(
                        DataSeries::StretchesOfQualityScores,
                    ),
                }),
            })),
            base_substitution_codes: external_byte(DataSeries::BaseSubstitutionCodes),
            insertion_bases: byte_array_stop(DataSeries::InsertionBases),
            reference_skip_lengths: external_int(DataSeries::ReferenceSkipLengths),
            padding_lengths: external_int(DataSeries::PaddingLengths),
            hard_clip_lengths: external_int(DataSeries::HardClipLengths),
            soft_clip_bases: byte_array_stop(DataSeries::SoftClipBases),
            mapping_qualities: external_int(DataSeries::MappingQualities),
            bases: external_byte(DataSeries::Bases),
            quality_scores: external_byte(DataSeries::QualityScores),
        }
    }

    /// Drops encodings whose canonical content ids saw no data.
    ///
    /// This only makes sense for tables built by [`Self::init`], where the
    /// content id of every series is `ContentId::from(DataSeries)`.
    pub fn retain_used_content_ids(&mut self, used: &HashSet<block::ContentId>) {
        macro_rules! clear_if_unused {
            ($field:ident, $series:expr) => {
                if !used.contains(&block::ContentId::from($series)) {
                    self.$field = None;
                }
            };
        }

        clear_if_unused!(bam_flags, DataSeries::BamFlags);
        clear_if_unused!(cram_flags, DataSeries::CramFlags);
        clear_if_unused!(reference_sequence_ids, DataSeries::ReferenceSequenceIds);
        clear_if_unused!(read_lengths, DataSeries::ReadLengths);
        clear_if_unused!(alignment_starts, DataSeries::AlignmentStarts);
        clear_if_unused!(read_group_ids, DataSeries::ReadGroupIds);
        clear_if_unused!(names, DataSeries::Names);
        clear_if_unused!(mate_flags, DataSeries::MateFlags);
        clear_if_unused!(
            mate_reference_sequence_ids,
            DataSeries::MateReferenceSequenceIds
        );
        clear_if_unused!(mate_alignment_starts, DataSeries::MateAlignmentStarts);
        clear_if_unused!(template_lengths, DataSeries::TemplateLengths);
        clear_if_unused!(mate_distances, DataSeries::MateDistances);
        clear_if_unused!(tag_set_ids, DataSeries::TagSetIds);
        clear_if_unused!(feature_counts, DataSeries::FeatureCounts);
        clear_if_unused!(feature_codes, DataSeries::FeatureCodes);
        clear_if_unused!(feature_position_deltas, DataSeries::FeaturePositionDeltas);
        clear_if_unused!(deletion_lengths, DataSeries::DeletionLengths);
        clear_if_unused!(stretches_of_bases, DataSeries::StretchesOfBases);
        clear_if_unused!(
            stretches_of_quality_scores,
            DataSeries::StretchesOfQualityScores
        );
        clear_if_unused!(base_substitution_codes, DataSeries::BaseSubstitutionCodes);
        clear_if_unused!(insertion_bases, DataSeries::InsertionBases);
        clear_if_unused!(reference_skip_lengths, DataSeries::ReferenceSkipLengths);
        clear_if_unused!(padding_lengths, DataSeries::PaddingLengths);
        clear_if_unused!(hard_clip_lengths, DataSeries::HardClipLengths);
        clear_if_unused!(soft_clip_bases, DataSeries::SoftClipBases);
        clear_if_unused!(mapping_qualities, DataSeries::MappingQualities);
        clear_if_unused!(bases, DataSeries::Bases);
        clear_if_unused!(quality_scores, DataSeries::QualityScores);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        let encodings = DataSeriesEncodings::init();

        assert_eq!(
            encodings.bam_flags(),
            Some(&Encoding::new(Integer::External {
                block_content_id: 1
            }))
        );

        assert_eq!(
            encodings.names(),
            Some(&Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: block::ContentId::from(DataSeries::Names),
            }))
        );
    }

    #[test]
    fn test_retain_used_content_ids() {
        let mut encodings = DataSeriesEncodings::init();

        let used = [
            block::ContentId::from(DataSeries::BamFlags),
            block::ContentId::from(DataSeries::ReadLengths),
        ]
        .into_iter()
        .collect();

        encodings.retain_used_content_ids(&used);

        assert!(encodings.bam_flags().is_some());
        assert!(encodings.read_lengths().is_some());
        assert!(encodings.cram_flags().is_none());
        assert!(encodings.quality_scores().is_none());
    }
}
