//! Slice record encoding.

use std::io;

use indexmap::IndexMap;

use super::super::convert::WriteRecord;
use crate::{
    container::{
        CompressionHeader, ReferenceSequenceContext,
        block,
        compression_header::{
            Encoding,
            data_series_encodings::DataSeries,
            encoding::codec::{Byte, ByteArray, Integer},
            tag_encodings,
        },
    },
    io::BitWriter,
    record::Feature,
};

/// Per-content-id output buffers for a slice's external blocks.
pub(crate) type ExternalDataWriters = IndexMap<block::ContentId, Vec<u8>>;

pub(super) struct SliceRecordWriter<'a> {
    compression_header: &'a CompressionHeader,
    pub(super) core_data_writer: BitWriter,
    pub(super) external_data_writers: ExternalDataWriters,
    reference_sequence_context: ReferenceSequenceContext,
    last_alignment_start: i32,
}

impl<'a> SliceRecordWriter<'a> {
    pub(super) fn new(
        compression_header: &'a CompressionHeader,
        reference_sequence_context: ReferenceSequenceContext,
    ) -> Self {
        let mut external_data_writers = ExternalDataWriters::default();

        // Every canonical series id plus the tag blocks get a buffer; empty
        // ones are dropped at assembly.
        for id in 1..=28 {
            external_data_writers.insert(id, Vec::new());
        }

        for key in compression_header.tag_encodings.keys() {
            external_data_writers.insert(*key, Vec::new());
        }

        let last_alignment_start = match reference_sequence_context {
            ReferenceSequenceContext::Some {
                alignment_start, ..
            } => usize::from(alignment_start) as i32,
            _ => 0,
        };

        Self {
            compression_header,
            core_data_writer: BitWriter::default(),
            external_data_writers,
            reference_sequence_context,
            last_alignment_start,
        }
    }

    pub(super) fn write_record(&mut self, record: &WriteRecord) -> io::Result<()> {
        self.put_int(
            DataSeries::BamFlags,
            i32::from(u16::from(record.bam_flags)),
        )?;
        self.put_int(DataSeries::CramFlags, i32::from(u8::from(record.cram_flags)))?;

        if self.reference_sequence_context.is_many() {
            let id = match record.reference_sequence_id {
                Some(id) => i32::try_from(id)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
                None => -1,
            };

            self.put_int(DataSeries::ReferenceSequenceIds, id)?;
        }

        let read_length = i32::try_from(record.read_length)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.put_int(DataSeries::ReadLengths, read_length)?;

        self.put_alignment_start(record)?;

        // The read group is carried inline in the auxiliary data.
        self.put_int(DataSeries::ReadGroupIds, -1)?;

        if self
            .compression_header
            .preservation_map
            .records_have_names()
        {
            self.put_byte_array(DataSeries::Names, record.name.to_vec())?;
        }

        if record.cram_flags.is_detached() {
            self.put_int(DataSeries::MateFlags, i32::from(u8::from(record.mate_flags)))?;

            let mate_reference_sequence_id = match record.mate_reference_sequence_id {
                Some(id) => i32::try_from(id)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
                None => -1,
            };
            self.put_int(
                DataSeries::MateReferenceSequenceIds,
                mate_reference_sequence_id,
            )?;

            let mate_alignment_start = record
                .mate_alignment_start
                .map(usize::from)
                .unwrap_or_default();
            self.put_int(
                DataSeries::MateAlignmentStarts,
                i32::try_from(mate_alignment_start)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
            )?;

            self.put_int(DataSeries::TemplateLengths, record.template_length)?;
        } else {
            if let Some(distance) = record.mate_distance {
                let distance = i32::try_from(distance)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                self.put_int(DataSeries::MateDistances, distance)?;
            }

            if let Some(n) = record.explicit_template_length {
                self.put_int(DataSeries::TemplateLengths, n)?;
            }
        }

        self.write_data(record)?;

        if record.is_mapped() {
            self.write_features(record)?;

            self.put_int(
                DataSeries::MappingQualities,
                i32::from(record.mapping_quality),
            )?;
        } else {
            self.put_byte_run(DataSeries::Bases, &record.sequence)?;
        }

        if record.cram_flags.has_quality_scores() {
            self.put_byte_run(DataSeries::QualityScores, &record.quality_scores)?;
        }

        Ok(())
    }

    fn put_alignment_start(&mut self, record: &WriteRecord) -> io::Result<()> {
        let alignment_start = record
            .alignment_start
            .map(usize::from)
            .unwrap_or_default();
        let alignment_start = i32::try_from(alignment_start)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let value = if self
            .compression_header
            .preservation_map
            .alignment_starts_are_deltas()
        {
            let delta = alignment_start.wrapping_sub(self.last_alignment_start);
            self.last_alignment_start = alignment_start;
            delta
        } else {
            alignment_start
        };

        self.put_int(DataSeries::AlignmentStarts, value)
    }

    fn write_data(&mut self, record: &WriteRecord) -> io::Result<()> {
        let tag_set_id = i32::try_from(record.tag_set_id)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.put_int(DataSeries::TagSetIds, tag_set_id)?;

        for (descriptor, value) in &record.tags {
            let key = tag_encodings::key(descriptor.tag, descriptor.ty);

            let encoding = self
                .compression_header
                .tag_encodings
                .get(&key)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("missing codec for tag key {key}"),
                    )
                })?;

            encoding.encode(
                &mut self.core_data_writer,
                &mut self.external_data_writers,
                value.clone(),
            )?;
        }

        Ok(())
    }

    fn write_features(&mut self, record: &WriteRecord) -> io::Result<()> {
        let feature_count = i32::try_from(record.features.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.put_int(DataSeries::FeatureCounts, feature_count)?;

        let mut prev_position = 0i32;

        for feature in &record.features {
            self.put_byte(DataSeries::FeatureCodes, feature.code())?;

            let position = usize::from(feature.position()) as i32;
            self.put_int(
                DataSeries::FeaturePositionDeltas,
                position.wrapping_sub(prev_position),
            )?;
            prev_position = position;

            match feature {
                Feature::Bases { bases, .. } => {
                    self.put_byte_array(DataSeries::StretchesOfBases, bases.clone())?;
                }
                Feature::Scores { quality_scores, .. } => {
                    self.put_byte_array(
                        DataSeries::StretchesOfQualityScores,
                        quality_scores.clone(),
                    )?;
                }
                Feature::ReadBase {
                    base,
                    quality_score,
                    ..
                } => {
                    self.put_byte(DataSeries::Bases, *base)?;
                    self.put_byte(DataSeries::QualityScores, *quality_score)?;
                }
                Feature::Substitution { code, .. } => {
                    self.put_byte(DataSeries::BaseSubstitutionCodes, *code)?;
                }
                Feature::Insertion { bases, .. } => {
                    self.put_byte_array(DataSeries::InsertionBases, bases.clone())?;
                }
                Feature::Deletion { len, .. } => {
                    self.put_length(DataSeries::DeletionLengths, *len)?;
                }
                Feature::InsertBase { base, .. } => {
                    self.put_byte(DataSeries::Bases, *base)?;
                }
                Feature::QualityScore { quality_score, .. } => {
                    self.put_byte(DataSeries::QualityScores, *quality_score)?;
                }
                Feature::ReferenceSkip { len, .. } => {
                    self.put_length(DataSeries::ReferenceSkipLengths, *len)?;
                }
                Feature::SoftClip { bases, .. } => {
                    self.put_byte_array(DataSeries::SoftClipBases, bases.clone())?;
                }
                Feature::Padding { len, .. } => {
                    self.put_length(DataSeries::PaddingLengths, *len)?;
                }
                Feature::HardClip { len, .. } => {
                    self.put_length(DataSeries::HardClipLengths, *len)?;
                }
            }
        }

        Ok(())
    }

    fn put_length(&mut self, data_series: DataSeries, len: usize) -> io::Result<()> {
        let n =
            i32::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.put_int(data_series, n)
    }

    fn put_int(&mut self, data_series: DataSeries, value: i32) -> io::Result<()> {
        self.integer_encoding(data_series)?.encode(
            &mut self.core_data_writer,
            &mut self.external_data_writers,
            value,
        )
    }

    fn put_byte(&mut self, data_series: DataSeries, value: u8) -> io::Result<()> {
        self.byte_encoding(data_series)?.encode(
            &mut self.core_data_writer,
            &mut self.external_data_writers,
            value,
        )
    }

    fn put_byte_array(&mut self, data_series: DataSeries, value: Vec<u8>) -> io::Result<()> {
        self.byte_array_encoding(data_series)?.encode(
            &mut self.core_data_writer,
            &mut self.external_data_writers,
            value,
        )
    }

    fn put_byte_run(&mut self, data_series: DataSeries, values: &[u8]) -> io::Result<()> {
        self.byte_encoding(data_series)?.get().encode_exact(
            &mut self.core_data_writer,
            &mut self.external_data_writers,
            values,
        )
    }

    fn integer_encoding(&self, data_series: DataSeries) -> io::Result<&'a Encoding<Integer>> {
        let encodings = &self.compression_header.data_series_encodings;

        let encoding = match data_series {
            DataSeries::BamFlags => encodings.bam_flags(),
            DataSeries::CramFlags => encodings.cram_flags(),
            DataSeries::ReferenceSequenceIds => encodings.reference_sequence_ids(),
            DataSeries::ReadLengths => encodings.read_lengths(),
            DataSeries::AlignmentStarts => encodings.alignment_starts(),
            DataSeries::ReadGroupIds => encodings.read_group_ids(),
            DataSeries::MateFlags => encodings.mate_flags(),
            DataSeries::MateReferenceSequenceIds => encodings.mate_reference_sequence_ids(),
            DataSeries::MateAlignmentStarts => encodings.mate_alignment_starts(),
            DataSeries::TemplateLengths => encodings.template_lengths(),
            DataSeries::MateDistances => encodings.mate_distances(),
            DataSeries::TagSetIds => encodings.tag_set_ids(),
            DataSeries::FeatureCounts => encodings.feature_counts(),
            DataSeries::FeaturePositionDeltas => encodings.feature_position_deltas(),
            DataSeries::DeletionLengths => encodings.deletion_lengths(),
            DataSeries::ReferenceSkipLengths => encodings.reference_skip_lengths(),
            DataSeries::PaddingLengths => encodings.padding_lengths(),
            DataSeries::HardClipLengths => encodings.hard_clip_lengths(),
            DataSeries::MappingQualities => encodings.mapping_qualities(),
            _ => None,
        };

        encoding.ok_or_else(|| missing_encoding(data_series))
    }

    fn byte_encoding(&self, data_series: DataSeries) -> io::Result<&'a Encoding<Byte>> {
        let encodings = &self.compression_header.data_series_encodings;

        let encoding = match data_series {
            DataSeries::FeatureCodes => encodings.feature_codes(),
            DataSeries::BaseSubstitutionCodes => encodings.base_substitution_codes(),
            DataSeries::Bases => encodings.bases(),
            DataSeries::QualityScores => encodings.quality_scores(),
            _ => None,
        };

        encoding.ok_or_else(|| missing_encoding(data_series))
    }

    fn byte_array_encoding(&self, data_series: DataSeries) -> io::Result<&'a Encoding<ByteArray>> {
        let encodings = &self.compression_header.data_series_encodings;

        let encoding = match data_series {
            DataSeries::Names => encodings.names(),
            DataSeries::StretchesOfBases => encodings.stretches_of_bases(),
            DataSeries::StretchesOfQualityScores => encodings.stretches_of_quality_scores(),
            DataSeries::InsertionBases => encodings.insertion_bases(),
            DataSeries::SoftClipBases => encodings.soft_clip_bases(),
            _ => None,
        };

        encoding.ok_or_else(|| missing_encoding(data_series))
    }
}

fn missing_encoding(data_series: DataSeries) -> io::Error {
    let name = <[u8; 2]>::from(data_series);

    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!(
            "missing encoding for data series {}{}",
            name[0] as char, name[1] as char
        ),
    )
}
