use std::io::{self, Write};

use super::encoding::{
    write_byte_array_encoding, write_byte_encoding, write_integer_encoding,
};
use crate::{
    container::compression_header::{
        DataSeriesEncodings, data_series_encodings::DataSeries,
    },
    io::writer::collections::write_map,
};

pub(super) fn write_data_series_encodings<W>(
    writer: &mut W,
    encodings: &DataSeriesEncodings,
) -> io::Result<()>
where
    W: Write,
{
    let mut items = Vec::new();
    let mut item_count = 0;

    macro_rules! write_int_series {
        ($field:ident, $series:expr) => {
            if let Some(encoding) = encodings.$field() {
                items.write_all(&<[u8; 2]>::from($series))?;
                write_integer_encoding(&mut items, encoding)?;
                item_count += 1;
            }
        };
    }

    macro_rules! write_byte_series {
        ($field:ident, $series:expr) => {
            if let Some(encoding) = encodings.$field() {
                items.write_all(&<[u8; 2]>::from($series))?;
                write_byte_encoding(&mut items, encoding)?;
                item_count += 1;
            }
        };
    }

    macro_rules! write_byte_array_series {
        ($field:ident, $series:expr) => {
            if let Some(encoding) = encodings.$field() {
                items.write_all(&<[u8; 2]>::from($series))?;
                write_byte_array_encoding(&mut items, encoding)?;
                item_count += 1;
            }
        };
    }

    write_int_series!(bam_flags, DataSeries::BamFlags);
    write_int_series!(cram_flags, DataSeries::CramFlags);
    write_int_series!(reference_sequence_ids, DataSeries::ReferenceSequenceIds);
    write_int_series!(read_lengths, DataSeries::ReadLengths);
    write_int_series!(alignment_starts, DataSeries::AlignmentStarts);
    write_int_series!(read_group_ids, DataSeries::ReadGroupIds);
    write_byte_array_series!(names, DataSeries::Names);
    write_int_series!(mate_flags, DataSeries::MateFlags);
    write_int_series!(
        mate_reference_sequence_ids,
        DataSeries::MateReferenceSequenceIds
    );
    write_int_series!(mate_alignment_starts, DataSeries::MateAlignmentStarts);
    write_int_series!(template_lengths, DataSeries::TemplateLengths);
    write_int_series!(mate_distances, DataSeries::MateDistances);
    write_int_series!(tag_set_ids, DataSeries::TagSetIds);
    write_int_series!(feature_counts, DataSeries::FeatureCounts);
    write_byte_series!(feature_codes, DataSeries::FeatureCodes);
    write_int_series!(feature_position_deltas, DataSeries::FeaturePositionDeltas);
    write_int_series!(deletion_lengths, DataSeries::DeletionLengths);
    write_byte_array_series!(stretches_of_bases, DataSeries::StretchesOfBases);
    write_byte_array_series!(
        stretches_of_quality_scores,
        DataSeries::StretchesOfQualityScores
    );
    write_byte_series!(base_substitution_codes, DataSeries::BaseSubstitutionCodes);
    write_byte_array_series!(insertion_bases, DataSeries::InsertionBases);
    write_int_series!(reference_skip_lengths, DataSeries::ReferenceSkipLengths);
    write_int_series!(padding_lengths, DataSeries::PaddingLengths);
    write_int_series!(hard_clip_lengths, DataSeries::HardClipLengths);
    write_byte_array_series!(soft_clip_bases, DataSeries::SoftClipBases);
    write_int_series!(mapping_qualities, DataSeries::MappingQualities);
    write_byte_series!(bases, DataSeries::Bases);
    write_byte_series!(quality_scores, DataSeries::QualityScores);

    write_map(writer, item_count, &items)
}
