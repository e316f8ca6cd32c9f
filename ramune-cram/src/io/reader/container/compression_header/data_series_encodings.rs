use std::io;

use super::encoding::{
    consume_any_encoding, read_byte_array_encoding, read_byte_encoding, read_integer_encoding,
};
use crate::{
    container::compression_header::{
        DataSeriesEncodings, data_series_encodings::DataSeries,
    },
    file_definition::Version,
    io::reader::collections::read_map,
};

pub(super) fn read_data_series_encodings(
    src: &mut &[u8],
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<DataSeriesEncodings> {
    let (mut buf, len) = read_map(src)?;
    read_data_series_encodings_inner(&mut buf, len, version, codec_ids)
}

fn read_data_series_encodings_inner(
    src: &mut &[u8],
    len: usize,
    version: Version,
    codec_ids: &mut u32,
) -> io::Result<DataSeriesEncodings> {
    let mut encodings = DataSeriesEncodings::default();

    for _ in 0..len {
        let Some(raw_key) = src.split_off(..2) else {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        };

        let Ok(data_series) = DataSeries::try_from([raw_key[0], raw_key[1]]) else {
            // Encodings for unknown series are skippable since descriptors
            // are self-delimiting.
            consume_any_encoding(src, version)?;
            continue;
        };

        match data_series {
            DataSeries::BamFlags => {
                encodings.bam_flags = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::CramFlags => {
                encodings.cram_flags = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::ReferenceSequenceIds => {
                encodings.reference_sequence_ids = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::ReadLengths => {
                encodings.read_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::AlignmentStarts => {
                encodings.alignment_starts = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::ReadGroupIds => {
                encodings.read_group_ids = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::Names => {
                encodings.names = Some(read_byte_array_encoding(src, version, codec_ids)?);
            }
            DataSeries::MateFlags => {
                encodings.mate_flags = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::MateReferenceSequenceIds => {
                encodings.mate_reference_sequence_ids =
                    Some(read_integer_encoding(src, version)?);
            }
            DataSeries::MateAlignmentStarts => {
                encodings.mate_alignment_starts = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::TemplateLengths => {
                encodings.template_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::MateDistances => {
                encodings.mate_distances = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::TagSetIds => {
                encodings.tag_set_ids = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::FeatureCounts => {
                encodings.feature_counts = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::FeatureCodes => {
                encodings.feature_codes = Some(read_byte_encoding(src, version, codec_ids)?);
            }
            DataSeries::FeaturePositionDeltas => {
                encodings.feature_position_deltas = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::DeletionLengths => {
                encodings.deletion_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::StretchesOfBases => {
                encodings.stretches_of_bases =
                    Some(read_byte_array_encoding(src, version, codec_ids)?);
            }
            DataSeries::StretchesOfQualityScores => {
                encodings.stretches_of_quality_scores =
                    Some(read_byte_array_encoding(src, version, codec_ids)?);
            }
            DataSeries::BaseSubstitutionCodes => {
                encodings.base_substitution_codes =
                    Some(read_byte_encoding(src, version, codec_ids)?);
            }
            DataSeries::InsertionBases => {
                encodings.insertion_bases =
                    Some(read_byte_array_encoding(src, version, codec_ids)?);
            }
            DataSeries::ReferenceSkipLengths => {
                encodings.reference_skip_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::PaddingLengths => {
                encodings.padding_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::HardClipLengths => {
                encodings.hard_clip_lengths = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::SoftClipBases => {
                encodings.soft_clip_bases =
                    Some(read_byte_array_encoding(src, version, codec_ids)?);
            }
            DataSeries::MappingQualities => {
                encodings.mapping_qualities = Some(read_integer_encoding(src, version)?);
            }
            DataSeries::Bases => {
                encodings.bases = Some(read_byte_encoding(src, version, codec_ids)?);
            }
            DataSeries::QualityScores => {
                encodings.quality_scores = Some(read_byte_encoding(src, version, codec_ids)?);
            }
        }
    }

    Ok(encodings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::compression_header::{
        Encoding,
        encoding::codec::{ByteArray, Integer},
    };

    #[test]
    fn test_read_data_series_encodings() -> io::Result<()> {
        let src = [
            0x0c, // map size in bytes
            0x03, // item count = 3
            b'B', b'F', 0x01, 0x01, 0x01, // BF = external(1)
            b'R', b'N', 0x05, 0x02, 0x00, 0x07, // RN = byte array stop(0, 7)
        ];

        let mut codec_ids = 0;
        let actual = read_data_series_encodings(&mut &src[..], Version::V3_0, &mut codec_ids);

        // item count lies (3 vs 2), so reading fails on truncation
        assert!(actual.is_err());

        let src = [
            0x0c, // map size in bytes
            0x02, // item count = 2
            b'B', b'F', 0x01, 0x01, 0x01, // BF = external(1)
            b'R', b'N', 0x05, 0x02, 0x00, 0x07, // RN = byte array stop(0, 7)
        ];

        let mut codec_ids = 0;
        let actual = read_data_series_encodings(&mut &src[..], Version::V3_0, &mut codec_ids)?;

        assert_eq!(
            actual.bam_flags(),
            Some(&Encoding::new(Integer::External {
                block_content_id: 1
            }))
        );
        assert_eq!(
            actual.names(),
            Some(&Encoding::new(ByteArray::ByteArrayStop {
                stop_byte: 0x00,
                block_content_id: 7,
            }))
        );
        assert!(actual.cram_flags().is_none());

        Ok(())
    }

    #[test]
    fn test_read_data_series_encodings_with_unknown_series() -> io::Result<()> {
        let src = [
            0x06, // map size in bytes
            0x01, // item count = 1
            b'Z', b'Z', 0x01, 0x01, 0x01, // unknown series, skipped
        ];

        let mut codec_ids = 0;
        let actual = read_data_series_encodings(&mut &src[..], Version::V3_0, &mut codec_ids)?;

        assert_eq!(actual, DataSeriesEncodings::default());

        Ok(())
    }
}
