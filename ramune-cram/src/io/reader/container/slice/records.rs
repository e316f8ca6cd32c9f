//! Slice record decoding.

mod alignment;
pub(crate) mod external_data_readers;
mod mates;

pub(crate) use self::external_data_readers::{ExpandedSeries, ExternalDataReaders};

use std::{borrow::Cow, io, sync::Arc};

use bstr::BString;
use md5::{Digest, Md5};
use ramune_core::Position;
use ramune_sam as sam;

use self::alignment::reconstruct;
use super::Slice;
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
    io::{
        BitReader,
        reader::{Options, RequiredFields},
    },
    record::{Feature, Flags, MateFlags, Record},
    reference::Repository,
};

bitflags::bitflags! {
    /// The set of data series a decode pass touches.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct DataSeriesSet: u32 {
        const BF = 1 << 0;
        const CF = 1 << 1;
        const RI = 1 << 2;
        const RL = 1 << 3;
        const AP = 1 << 4;
        const RG = 1 << 5;
        const RN = 1 << 6;
        const MF = 1 << 7;
        const NS = 1 << 8;
        const NP = 1 << 9;
        const TS = 1 << 10;
        const NF = 1 << 11;
        const TL = 1 << 12;
        const FN = 1 << 13;
        const FC = 1 << 14;
        const FP = 1 << 15;
        const DL = 1 << 16;
        const BB = 1 << 17;
        const QQ = 1 << 18;
        const BS = 1 << 19;
        const IN = 1 << 20;
        const RS = 1 << 21;
        const PD = 1 << 22;
        const HC = 1 << 23;
        const SC = 1 << 24;
        const MQ = 1 << 25;
        const BA = 1 << 26;
        const QS = 1 << 27;
        const AUX = 1 << 28;
    }
}

impl DataSeriesSet {
    const CIGAR: Self = Self::FN
        .union(Self::FC)
        .union(Self::FP)
        .union(Self::DL)
        .union(Self::IN)
        .union(Self::SC)
        .union(Self::HC)
        .union(Self::PD)
        .union(Self::RS)
        .union(Self::RL)
        .union(Self::BF);

    const SEQ: Self = Self::CIGAR
        .union(Self::BA)
        .union(Self::BB)
        .union(Self::QQ)
        .union(Self::BS)
        .union(Self::QS)
        .union(Self::RI)
        .union(Self::AP);

    const QUAL: Self = Self::QS.union(Self::RL).union(Self::CF);
}

/// Maps the caller's required fields onto data series and closes over
/// decode-order dependencies.
fn required_data_series(
    required_fields: RequiredFields,
    compression_header: &CompressionHeader,
) -> DataSeriesSet {
    if required_fields == RequiredFields::all() {
        return DataSeriesSet::all();
    }

    let mut set = DataSeriesSet::empty();

    if required_fields.contains(RequiredFields::NAME) {
        set |= DataSeriesSet::RN;
    }

    if required_fields.contains(RequiredFields::FLAGS) {
        set |= DataSeriesSet::BF;
    }

    if required_fields.contains(RequiredFields::REFERENCE_SEQUENCE_ID) {
        set |= DataSeriesSet::RI | DataSeriesSet::BF;
    }

    if required_fields.contains(RequiredFields::ALIGNMENT_START) {
        set |= DataSeriesSet::AP | DataSeriesSet::BF;
    }

    if required_fields.contains(RequiredFields::MAPPING_QUALITY) {
        set |= DataSeriesSet::MQ;
    }

    if required_fields.contains(RequiredFields::CIGAR) {
        set |= DataSeriesSet::CIGAR;
    }

    if required_fields.contains(RequiredFields::MATE_REFERENCE_SEQUENCE_ID) {
        set |= DataSeriesSet::CF | DataSeriesSet::NF | DataSeriesSet::RI | DataSeriesSet::NS
            | DataSeriesSet::BF;
    }

    if required_fields.contains(RequiredFields::MATE_ALIGNMENT_START) {
        set |= DataSeriesSet::CF | DataSeriesSet::NF | DataSeriesSet::AP | DataSeriesSet::NP
            | DataSeriesSet::BF;
    }

    if required_fields.contains(RequiredFields::TEMPLATE_LENGTH) {
        set |= DataSeriesSet::CF
            | DataSeriesSet::NF
            | DataSeriesSet::AP
            | DataSeriesSet::TS
            | DataSeriesSet::BF
            | DataSeriesSet::MF
            | DataSeriesSet::RI
            | DataSeriesSet::CIGAR;
    }

    if required_fields.contains(RequiredFields::SEQUENCE) {
        set |= DataSeriesSet::SEQ;
    }

    if required_fields.contains(RequiredFields::QUALITY_SCORES) {
        set |= DataSeriesSet::QUAL;
    }

    if required_fields.contains(RequiredFields::DATA) {
        set |= DataSeriesSet::RG | DataSeriesSet::TL | DataSeriesSet::AUX;
    }

    if required_fields.contains(RequiredFields::READ_GROUP) {
        set |= DataSeriesSet::RG | DataSeriesSet::BF;
    }

    // Close over decode-order dependencies until stable.
    loop {
        let before = set;

        let feature_payloads = DataSeriesSet::RS
            | DataSeriesSet::PD
            | DataSeriesSet::HC
            | DataSeriesSet::QS
            | DataSeriesSet::IN
            | DataSeriesSet::SC
            | DataSeriesSet::BS
            | DataSeriesSet::DL
            | DataSeriesSet::BA
            | DataSeriesSet::BB
            | DataSeriesSet::QQ;

        if set.intersects(feature_payloads) {
            set |= DataSeriesSet::FC | DataSeriesSet::FP;
        }

        if set.intersects(DataSeriesSet::FN | DataSeriesSet::FC | DataSeriesSet::FP) {
            set |= DataSeriesSet::RL;
        }

        if set.contains(DataSeriesSet::FP) {
            set |= DataSeriesSet::FC;
        }

        if set.contains(DataSeriesSet::FC) {
            set |= DataSeriesSet::FN;
        }

        if set.contains(DataSeriesSet::AUX) {
            set |= DataSeriesSet::TL;
        }

        if set.contains(DataSeriesSet::MQ) {
            set |= DataSeriesSet::BF;
        }

        if set.contains(DataSeriesSet::BS) {
            set |= DataSeriesSet::RI;
        }

        if set.intersects(
            DataSeriesSet::MF
                | DataSeriesSet::NS
                | DataSeriesSet::NP
                | DataSeriesSet::TS
                | DataSeriesSet::NF,
        ) {
            set |= DataSeriesSet::CF;
        }

        if !compression_header.preservation_map.records_have_names()
            && set.contains(DataSeriesSet::RN)
        {
            set |= DataSeriesSet::CF | DataSeriesSet::NF;
        }

        if set.intersects(
            DataSeriesSet::BA | DataSeriesSet::QS | DataSeriesSet::BB | DataSeriesSet::QQ,
        ) {
            set |= DataSeriesSet::BF | DataSeriesSet::CF | DataSeriesSet::RL;
        }

        if set == before {
            break;
        }
    }

    // Skipping a series that shares the core bitstream would desynchronize
    // the bit cursor, so any core-backed encoding forces a full decode.
    if uses_core_block(compression_header) {
        return DataSeriesSet::all();
    }

    set
}

fn data_series_bit(data_series: DataSeries) -> DataSeriesSet {
    match data_series {
        DataSeries::BamFlags => DataSeriesSet::BF,
        DataSeries::CramFlags => DataSeriesSet::CF,
        DataSeries::ReferenceSequenceIds => DataSeriesSet::RI,
        DataSeries::ReadLengths => DataSeriesSet::RL,
        DataSeries::AlignmentStarts => DataSeriesSet::AP,
        DataSeries::ReadGroupIds => DataSeriesSet::RG,
        DataSeries::Names => DataSeriesSet::RN,
        DataSeries::MateFlags => DataSeriesSet::MF,
        DataSeries::MateReferenceSequenceIds => DataSeriesSet::NS,
        DataSeries::MateAlignmentStarts => DataSeriesSet::NP,
        DataSeries::TemplateLengths => DataSeriesSet::TS,
        DataSeries::MateDistances => DataSeriesSet::NF,
        DataSeries::TagSetIds => DataSeriesSet::TL,
        DataSeries::FeatureCounts => DataSeriesSet::FN,
        DataSeries::FeatureCodes => DataSeriesSet::FC,
        DataSeries::FeaturePositionDeltas => DataSeriesSet::FP,
        DataSeries::DeletionLengths => DataSeriesSet::DL,
        DataSeries::StretchesOfBases => DataSeriesSet::BB,
        DataSeries::StretchesOfQualityScores => DataSeriesSet::QQ,
        DataSeries::BaseSubstitutionCodes => DataSeriesSet::BS,
        DataSeries::InsertionBases => DataSeriesSet::IN,
        DataSeries::ReferenceSkipLengths => DataSeriesSet::RS,
        DataSeries::PaddingLengths => DataSeriesSet::PD,
        DataSeries::HardClipLengths => DataSeriesSet::HC,
        DataSeries::SoftClipBases => DataSeriesSet::SC,
        DataSeries::MappingQualities => DataSeriesSet::MQ,
        DataSeries::Bases => DataSeriesSet::BA,
        DataSeries::QualityScores => DataSeriesSet::QS,
    }
}

const ALL_DATA_SERIES: [DataSeries; 28] = [
    DataSeries::BamFlags,
    DataSeries::CramFlags,
    DataSeries::ReferenceSequenceIds,
    DataSeries::ReadLengths,
    DataSeries::AlignmentStarts,
    DataSeries::ReadGroupIds,
    DataSeries::Names,
    DataSeries::MateFlags,
    DataSeries::MateReferenceSequenceIds,
    DataSeries::MateAlignmentStarts,
    DataSeries::TemplateLengths,
    DataSeries::MateDistances,
    DataSeries::TagSetIds,
    DataSeries::FeatureCounts,
    DataSeries::FeatureCodes,
    DataSeries::FeaturePositionDeltas,
    DataSeries::DeletionLengths,
    DataSeries::StretchesOfBases,
    DataSeries::StretchesOfQualityScores,
    DataSeries::BaseSubstitutionCodes,
    DataSeries::InsertionBases,
    DataSeries::ReferenceSkipLengths,
    DataSeries::PaddingLengths,
    DataSeries::HardClipLengths,
    DataSeries::SoftClipBases,
    DataSeries::MappingQualities,
    DataSeries::Bases,
    DataSeries::QualityScores,
];

fn integer_codec_block_content_ids(codec: &Integer, ids: &mut Vec<block::ContentId>) {
    if let Integer::External { block_content_id } = codec {
        ids.push(*block_content_id);
    }
}

fn byte_codec_block_content_ids(codec: &Byte, ids: &mut Vec<block::ContentId>) {
    match codec {
        Byte::External { block_content_id } => ids.push(*block_content_id),
        Byte::Pack { sub_encoding, .. } => {
            byte_codec_block_content_ids(sub_encoding.get(), ids);
        }
        Byte::Rle {
            len_block_content_id,
            value_encoding,
            ..
        } => {
            ids.push(*len_block_content_id);
            byte_codec_block_content_ids(value_encoding.get(), ids);
        }
        _ => {}
    }
}

fn byte_array_codec_block_content_ids(codec: &ByteArray, ids: &mut Vec<block::ContentId>) {
    match codec {
        ByteArray::ByteArrayLength {
            len_encoding,
            value_encoding,
        } => {
            integer_codec_block_content_ids(len_encoding.get(), ids);
            byte_codec_block_content_ids(value_encoding.get(), ids);
        }
        ByteArray::ByteArrayStop {
            block_content_id, ..
        } => ids.push(*block_content_id),
    }
}

fn integer_codec_uses_core(codec: &Integer) -> bool {
    matches!(
        codec,
        Integer::Golomb { .. }
            | Integer::Beta { .. }
            | Integer::Subexp { .. }
            | Integer::GolombRice { .. }
            | Integer::Gamma { .. }
    ) || matches!(codec, Integer::Huffman { alphabet, .. } if alphabet.len() > 1)
}

fn byte_codec_uses_core(codec: &Byte) -> bool {
    match codec {
        Byte::Huffman { alphabet, .. } => alphabet.len() > 1,
        Byte::Pack { sub_encoding, .. } => byte_codec_uses_core(sub_encoding.get()),
        Byte::Rle { value_encoding, .. } => byte_codec_uses_core(value_encoding.get()),
        _ => false,
    }
}

fn byte_array_codec_uses_core(codec: &ByteArray) -> bool {
    match codec {
        ByteArray::ByteArrayLength {
            len_encoding,
            value_encoding,
        } => {
            integer_codec_uses_core(len_encoding.get())
                || byte_codec_uses_core(value_encoding.get())
        }
        ByteArray::ByteArrayStop { .. } => false,
    }
}

fn uses_core_block(compression_header: &CompressionHeader) -> bool {
    let encodings = &compression_header.data_series_encodings;

    for data_series in ALL_DATA_SERIES {
        let uses_core = match data_series_encoding_kind(data_series) {
            EncodingKind::Integer => integer_encoding(encodings, data_series)
                .is_some_and(|e| integer_codec_uses_core(e.get())),
            EncodingKind::Byte => byte_encoding(encodings, data_series)
                .is_some_and(|e| byte_codec_uses_core(e.get())),
            EncodingKind::ByteArray => byte_array_encoding(encodings, data_series)
                .is_some_and(|e| byte_array_codec_uses_core(e.get())),
        };

        if uses_core {
            return true;
        }
    }

    compression_header
        .tag_encodings
        .values()
        .any(|e| byte_array_codec_uses_core(e.get()))
}

enum EncodingKind {
    Integer,
    Byte,
    ByteArray,
}

fn data_series_encoding_kind(data_series: DataSeries) -> EncodingKind {
    match data_series {
        DataSeries::FeatureCodes
        | DataSeries::BaseSubstitutionCodes
        | DataSeries::Bases
        | DataSeries::QualityScores => EncodingKind::Byte,
        DataSeries::Names
        | DataSeries::StretchesOfBases
        | DataSeries::StretchesOfQualityScores
        | DataSeries::InsertionBases
        | DataSeries::SoftClipBases => EncodingKind::ByteArray,
        _ => EncodingKind::Integer,
    }
}

fn integer_encoding(
    encodings: &crate::container::compression_header::DataSeriesEncodings,
    data_series: DataSeries,
) -> Option<&Encoding<Integer>> {
    match data_series {
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
    }
}

fn byte_encoding(
    encodings: &crate::container::compression_header::DataSeriesEncodings,
    data_series: DataSeries,
) -> Option<&Encoding<Byte>> {
    match data_series {
        DataSeries::FeatureCodes => encodings.feature_codes(),
        DataSeries::BaseSubstitutionCodes => encodings.base_substitution_codes(),
        DataSeries::Bases => encodings.bases(),
        DataSeries::QualityScores => encodings.quality_scores(),
        _ => None,
    }
}

fn byte_array_encoding(
    encodings: &crate::container::compression_header::DataSeriesEncodings,
    data_series: DataSeries,
) -> Option<&Encoding<ByteArray>> {
    match data_series {
        DataSeries::Names => encodings.names(),
        DataSeries::StretchesOfBases => encodings.stretches_of_bases(),
        DataSeries::StretchesOfQualityScores => encodings.stretches_of_quality_scores(),
        DataSeries::InsertionBases => encodings.insertion_bases(),
        DataSeries::SoftClipBases => encodings.soft_clip_bases(),
        _ => None,
    }
}

fn missing_codec(data_series: DataSeries) -> io::Error {
    let name = <[u8; 2]>::from(data_series);

    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "missing codec for data series {}{}",
            name[0] as char, name[1] as char
        ),
    )
}

/// Reference bases with a 1-based offset of the first stored base.
pub(crate) struct ReferenceBases {
    bases: Arc<[u8]>,
    offset: usize,
}

impl ReferenceBases {
    #[cfg(test)]
    pub(crate) fn new(bases: Arc<[u8]>, offset: usize) -> Self {
        Self { bases, offset }
    }

    /// Returns the base at the 1-based reference position.
    fn get(&self, position: usize) -> Option<u8> {
        position
            .checked_sub(self.offset)
            .and_then(|i| self.bases.get(i))
            .copied()
    }

    fn end(&self) -> usize {
        self.offset + self.bases.len() - 1
    }
}

enum SliceReference {
    /// No reference is required or available.
    None,
    /// A single-reference slice.
    Single(ReferenceBases),
    /// A multi-reference slice; bases are fetched per record.
    Multi,
}

impl Slice {
    /// Decodes all records of this slice.
    pub(crate) fn records(
        &self,
        compression_header: &CompressionHeader,
        header: &sam::Header,
        reference_sequence_repository: &Repository,
        options: &Options,
    ) -> io::Result<Vec<Record>> {
        let needed = required_data_series(options.required_fields, compression_header);

        let core_data = self.core_data_block.decode()?;

        let external_data = self.decode_external_blocks(compression_header, needed)?;

        let slice_reference = self.resolve_reference(
            compression_header,
            header,
            reference_sequence_repository,
            options,
        )?;

        let mut external_data_readers = ExternalDataReaders::new();
        for (id, buf) in &external_data {
            external_data_readers.insert(*id, buf);
        }

        let mut decoder = RecordDecoder {
            compression_header,
            core_data_reader: BitReader::new(&core_data),
            external_data_readers,
            needed,
            header,
            reference_sequence_repository,
            options,
            reference_sequence_context: self.header.reference_sequence_context,
            last_alignment_start: initial_alignment_start(
                self.header.reference_sequence_context,
            ),
        };

        let mut records = Vec::with_capacity(self.header.record_count);

        for _ in 0..self.header.record_count {
            let record = decoder.decode_record(&slice_reference)?;
            records.push(record);
        }

        let chain_leaders = mates::resolve(&mut records, options.required_fields)?;

        assign_missing_names(&mut records, self.header.record_counter, &chain_leaders);

        Ok(records)
    }

    /// Uncompresses the external blocks whose content ids are referenced by
    /// codecs of the needed data series.
    fn decode_external_blocks(
        &self,
        compression_header: &CompressionHeader,
        needed: DataSeriesSet,
    ) -> io::Result<Vec<(block::ContentId, Cow<'_, [u8]>)>> {
        let mut ids = Vec::new();

        let encodings = &compression_header.data_series_encodings;

        for data_series in ALL_DATA_SERIES {
            if !needed.contains(data_series_bit(data_series)) {
                continue;
            }

            match data_series_encoding_kind(data_series) {
                EncodingKind::Integer => {
                    if let Some(encoding) = integer_encoding(encodings, data_series) {
                        integer_codec_block_content_ids(encoding.get(), &mut ids);
                    }
                }
                EncodingKind::Byte => {
                    if let Some(encoding) = byte_encoding(encodings, data_series) {
                        byte_codec_block_content_ids(encoding.get(), &mut ids);
                    }
                }
                EncodingKind::ByteArray => {
                    if let Some(encoding) = byte_array_encoding(encodings, data_series) {
                        byte_array_codec_block_content_ids(encoding.get(), &mut ids);
                    }
                }
            }
        }

        if needed.contains(DataSeriesSet::AUX) {
            for encoding in compression_header.tag_encodings.values() {
                byte_array_codec_block_content_ids(encoding.get(), &mut ids);
            }
        }

        let mut buffers = Vec::with_capacity(self.external_blocks.len());

        for external_block in &self.external_blocks {
            if !ids.contains(&external_block.content_id) {
                continue;
            }

            buffers.push((external_block.content_id, external_block.decode()?));
        }

        Ok(buffers)
    }

    fn resolve_reference(
        &self,
        compression_header: &CompressionHeader,
        header: &sam::Header,
        reference_sequence_repository: &Repository,
        options: &Options,
    ) -> io::Result<SliceReference> {
        if !compression_header.preservation_map.reference_required() {
            return Ok(SliceReference::None);
        }

        match self.header.reference_sequence_context {
            ReferenceSequenceContext::None => Ok(SliceReference::None),
            ReferenceSequenceContext::Many => Ok(SliceReference::Multi),
            ReferenceSequenceContext::Some {
                reference_sequence_id,
                alignment_start,
                alignment_end,
            } => {
                let bases = if let Some(id) =
                    self.header.embedded_reference_bases_block_content_id
                {
                    let block = self
                        .external_blocks
                        .iter()
                        .find(|b| b.content_id == id)
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("missing external block: {id}"),
                            )
                        })?;

                    ReferenceBases {
                        bases: block.decode()?.into_owned().into(),
                        offset: usize::from(alignment_start),
                    }
                } else {
                    let name = header
                        .reference_sequence_name(reference_sequence_id)
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!(
                                    "invalid reference sequence id: {reference_sequence_id}"
                                ),
                            )
                        })?;

                    let bases = reference_sequence_repository
                        .get(name)
                        .transpose()?
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("missing reference sequence: {name}"),
                            )
                        })?;

                    ReferenceBases { bases, offset: 1 }
                };

                if !options.ignore_reference_md5 {
                    validate_reference_md5(
                        &bases,
                        alignment_start,
                        alignment_end,
                        self.header.reference_md5,
                    )?;
                }

                Ok(SliceReference::Single(bases))
            }
        }
    }
}

fn initial_alignment_start(context: ReferenceSequenceContext) -> i32 {
    match context {
        ReferenceSequenceContext::Some {
            alignment_start, ..
        } => usize::from(alignment_start) as i32,
        _ => 0,
    }
}

fn validate_reference_md5(
    bases: &ReferenceBases,
    alignment_start: Position,
    alignment_end: Position,
    expected: Option<[u8; 16]>,
) -> io::Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let start = usize::from(alignment_start);
    // Slices may promise a span past the end of the reference; the digest
    // covers what exists.
    let end = usize::from(alignment_end).min(bases.end());

    let mut hasher = Md5::new();

    if start <= end {
        let i = start - bases.offset;
        let j = end - bases.offset + 1;
        hasher.update(&bases.bases[i..j]);
    }

    let actual: [u8; 16] = hasher.finalize().into();

    if actual != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "reference checksum mismatch",
        ));
    }

    Ok(())
}

fn assign_missing_names(records: &mut [Record], record_counter: u64, chain_leaders: &[usize]) {
    for i in 0..records.len() {
        if records[i].name.is_some() {
            continue;
        }

        // Mates share the generated name via their chain leader.
        let leader = chain_leaders.get(i).copied().unwrap_or(i);

        let name = BString::from(format!("q{}", record_counter + leader as u64));
        records[i].name = Some(name);
    }
}

struct RecordDecoder<'a, 'de> {
    compression_header: &'a CompressionHeader,
    core_data_reader: BitReader<'de>,
    external_data_readers: ExternalDataReaders<'de>,
    needed: DataSeriesSet,
    header: &'a sam::Header,
    reference_sequence_repository: &'a Repository,
    options: &'a Options,
    reference_sequence_context: ReferenceSequenceContext,
    last_alignment_start: i32,
}

impl RecordDecoder<'_, '_> {
    fn decode_record(&mut self, slice_reference: &SliceReference) -> io::Result<Record> {
        let mut record = Record::default();

        record.bam_flags = if self.needed.contains(DataSeriesSet::BF) {
            let n = self.decode_int(DataSeries::BamFlags)?;
            let n = u16::try_from(n)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            sam::Flags::from(n)
        } else {
            sam::Flags::UNMAPPED
        };

        record.cram_flags = if self.needed.contains(DataSeriesSet::CF) {
            let n = self.decode_int(DataSeries::CramFlags)?;
            let n =
                u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Flags::from(n)
        } else {
            Flags::empty()
        };

        record.reference_sequence_id = self.decode_reference_sequence_id()?;

        record.read_length = if self.needed.contains(DataSeriesSet::RL) {
            let n = self.decode_int(DataSeries::ReadLengths)?;
            usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        } else {
            0
        };

        record.alignment_start = self.decode_alignment_start()?;

        record.read_group_id = self.decode_read_group_id()?;

        if self.needed.contains(DataSeriesSet::RN)
            && self.compression_header.preservation_map.records_have_names()
        {
            record.name = Some(BString::from(
                self.decode_byte_array(DataSeries::Names)?,
            ));
        }

        if record.cram_flags.is_detached() {
            self.decode_detached_mate(&mut record)?;
        } else if record.cram_flags.has_mate_downstream() {
            if self.needed.contains(DataSeriesSet::NF) {
                let n = self.decode_int(DataSeries::MateDistances)?;
                let n = usize::try_from(n)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                record.mate_distance = Some(n);
            }

            self.decode_explicit_template_length(&mut record)?;
        } else {
            self.decode_explicit_template_length(&mut record)?;
        }

        let (generate_md, generate_nm) = self.decode_data(&mut record)?;

        self.decode_alignment(&mut record, slice_reference, generate_md, generate_nm)?;

        Ok(record)
    }

    fn decode_reference_sequence_id(&mut self) -> io::Result<Option<usize>> {
        let raw_id = match self.reference_sequence_context {
            ReferenceSequenceContext::Many => {
                if self.needed.contains(DataSeriesSet::RI) {
                    self.decode_int(DataSeries::ReferenceSequenceIds)?
                } else {
                    -1
                }
            }
            context => context.raw_reference_sequence_id(),
        };

        match raw_id {
            -1 => Ok(None),
            n => {
                let id = usize::try_from(n)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                if id >= self.header.reference_sequences().len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid reference sequence id: {id}"),
                    ));
                }

                Ok(Some(id))
            }
        }
    }

    fn decode_alignment_start(&mut self) -> io::Result<Option<Position>> {
        if !self.needed.contains(DataSeriesSet::AP) {
            return Ok(None);
        }

        let n = self.decode_int(DataSeries::AlignmentStarts)?;

        let alignment_start = if self
            .compression_header
            .preservation_map
            .alignment_starts_are_deltas()
        {
            let position = self.last_alignment_start.wrapping_add(n);
            self.last_alignment_start = position;
            position
        } else {
            n
        };

        match alignment_start {
            n if n <= 0 => Ok(None),
            n => Ok(Position::new(n as usize)),
        }
    }

    fn decode_read_group_id(&mut self) -> io::Result<Option<usize>> {
        if !self.needed.contains(DataSeriesSet::RG) {
            return Ok(None);
        }

        match self.decode_int(DataSeries::ReadGroupIds)? {
            -1 => Ok(None),
            n => {
                let id = usize::try_from(n)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                let name = self.header.read_group_ids().get(id).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid read group id: {id}"),
                    )
                })?;

                // A sentinel read group stands in for "none".
                if name.as_slice() == b"UNKNOWN" {
                    Ok(None)
                } else {
                    Ok(Some(id))
                }
            }
        }
    }

    fn decode_detached_mate(&mut self, record: &mut Record) -> io::Result<()> {
        if self.needed.contains(DataSeriesSet::MF) {
            let n = self.decode_int(DataSeries::MateFlags)?;
            let n =
                u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            record.mate_flags = MateFlags::from(n);
        }

        if record.mate_flags.is_on_negative_strand() {
            record.bam_flags |= sam::Flags::MATE_REVERSE_COMPLEMENTED;
        }

        if record.mate_flags.is_unmapped() {
            record.bam_flags |= sam::Flags::MATE_UNMAPPED;
        }

        if self.needed.contains(DataSeriesSet::RN)
            && !self.compression_header.preservation_map.records_have_names()
        {
            record.name = Some(BString::from(
                self.decode_byte_array(DataSeries::Names)?,
            ));
        }

        if self.needed.contains(DataSeriesSet::NS) {
            let n = self.decode_int(DataSeries::MateReferenceSequenceIds)?;

            record.mate_reference_sequence_id = match n {
                -1 => None,
                n => Some(
                    usize::try_from(n)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
                ),
            };
        }

        if self.needed.contains(DataSeriesSet::NP) {
            let n = self.decode_int(DataSeries::MateAlignmentStarts)?;
            record.mate_alignment_start = usize::try_from(n).ok().and_then(Position::new);
        }

        if self.needed.contains(DataSeriesSet::TS) {
            record.template_length = self.decode_int(DataSeries::TemplateLengths)?;
        }

        Ok(())
    }

    fn decode_explicit_template_length(&mut self, record: &mut Record) -> io::Result<()> {
        if record.cram_flags.has_explicit_template_length()
            && self.needed.contains(DataSeriesSet::TS)
        {
            let n = self.decode_int(DataSeries::TemplateLengths)?;
            record.explicit_template_length = Some(n);
        }

        Ok(())
    }

    /// Decodes the auxiliary data, returning whether MD and NM are to be
    /// generated from the reference.
    fn decode_data(&mut self, record: &mut Record) -> io::Result<(bool, bool)> {
        let mut generate_md = self.options.decode_md;
        let mut generate_nm = self.options.decode_md;

        // The tag set id is only needed to decode tag values, so both are
        // skipped together.
        if !self.needed.contains(DataSeriesSet::TL | DataSeriesSet::AUX) {
            return Ok((false, false));
        }

        let tag_set_id = self.decode_int(DataSeries::TagSetIds).and_then(|n| {
            usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let tag_sets = self.compression_header.preservation_map.tag_sets();

        let tag_set = tag_sets.get(tag_set_id).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid tag set id: {tag_set_id}"),
            )
        })?;

        for descriptor in tag_set.to_vec() {
            if descriptor.ty == b'*' {
                // A placeholder marks a value recomputed at decode time.
                match &descriptor.tag {
                    b"MD" => generate_md = true,
                    b"NM" => generate_nm = true,
                    _ => {}
                }

                continue;
            }

            let value = self.decode_tag_value(descriptor.tag, descriptor.ty)?;

            record.data.extend_from_slice(&descriptor.tag);
            record.data.push(descriptor.ty);
            record.data.extend_from_slice(&value);
        }

        // A read group stored as a data series is re-materialized as its
        // auxiliary tag.
        if let Some(id) = record.read_group_id {
            if let Some(name) = self.header.read_group_ids().get(id) {
                record.data.extend_from_slice(b"RGZ");
                record.data.extend_from_slice(name);
                record.data.push(0x00);
            }
        }

        Ok((generate_md, generate_nm))
    }

    fn decode_tag_value(&mut self, tag: [u8; 2], ty: u8) -> io::Result<Vec<u8>> {
        let key = tag_encodings::key(tag, ty);

        let encoding = self
            .compression_header
            .tag_encodings
            .get(&key)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "missing codec for tag {}{}:{}",
                        tag[0] as char, tag[1] as char, ty as char
                    ),
                )
            })?;

        let value =
            encoding.decode(&mut self.core_data_reader, &mut self.external_data_readers)?;

        validate_tag_value(ty, &value)?;

        Ok(value)
    }

    fn decode_alignment(
        &mut self,
        record: &mut Record,
        slice_reference: &SliceReference,
        generate_md: bool,
        generate_nm: bool,
    ) -> io::Result<()> {
        let read_length = record.read_length;

        let is_mapped = !record.bam_flags.is_unmapped() && record.alignment_start.is_some();

        if is_mapped {
            self.decode_mapped_alignment(record, slice_reference, generate_md, generate_nm)
        } else {
            self.decode_unmapped_alignment(record)
        }
        .map(|()| {
            // Quality scores stored in sequencing orientation are flipped
            // back for reverse-complemented records.
            if !self
                .compression_header
                .preservation_map
                .quality_scores_use_reference_orientation()
                && record.bam_flags.is_reverse_complemented()
            {
                record.quality_scores.reverse();
            }

            debug_assert!(
                record.quality_scores.is_empty() || record.quality_scores.len() == read_length
            );
        })
    }

    fn decode_mapped_alignment(
        &mut self,
        record: &mut Record,
        slice_reference: &SliceReference,
        generate_md: bool,
        generate_nm: bool,
    ) -> io::Result<()> {
        let features = self.decode_features()?;

        let alignment_start = record.alignment_start.unwrap_or(Position::MIN);

        let reference_bases = self.record_reference_bases(record, slice_reference)?;

        let mut quality_scores = vec![255; record.read_length];

        let build_sequence = !record.cram_flags.is_sequence_missing()
            && self.needed.contains(DataSeriesSet::BA);

        let generate_md = generate_md && !record.cram_flags.is_sequence_missing();
        let generate_nm = generate_nm && !record.cram_flags.is_sequence_missing();

        let alignment = reconstruct(
            &features,
            record.read_length,
            alignment_start,
            reference_bases.as_ref(),
            self.compression_header.preservation_map.substitution_matrix(),
            &mut quality_scores,
            build_sequence,
            generate_md || generate_nm,
        )?;

        record.cigar = alignment.cigar;
        record.alignment_end = alignment.alignment_end;

        if build_sequence {
            record.sequence = alignment.sequence;
        }

        record.mapping_quality = if self.needed.contains(DataSeriesSet::MQ) {
            let n = self.decode_int(DataSeries::MappingQualities)?;
            u8::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        } else {
            40
        };

        if record.cram_flags.has_quality_scores() && self.needed.contains(DataSeriesSet::QS) {
            quality_scores.clear();
            self.decode_byte_run(
                DataSeries::QualityScores,
                &mut quality_scores,
                record.read_length,
            )?;
        }

        record.quality_scores = quality_scores;

        if generate_md {
            if let Some(md) = &alignment.md {
                record.data.extend_from_slice(b"MDZ");
                record.data.extend_from_slice(md.as_bytes());
                record.data.push(0x00);
            }
        }

        if generate_nm {
            if let Some(nm) = alignment.nm {
                record.data.extend_from_slice(b"NMi");
                record.data.extend_from_slice(&nm.to_le_bytes());
            }
        }

        Ok(())
    }

    fn decode_unmapped_alignment(&mut self, record: &mut Record) -> io::Result<()> {
        if !record.cram_flags.is_sequence_missing() && self.needed.contains(DataSeriesSet::BA) {
            let mut sequence = Vec::with_capacity(record.read_length);
            self.decode_byte_run(DataSeries::Bases, &mut sequence, record.read_length)?;
            record.sequence = sequence;
        }

        if record.cram_flags.has_quality_scores() && self.needed.contains(DataSeriesSet::QS) {
            let mut quality_scores = Vec::with_capacity(record.read_length);
            self.decode_byte_run(
                DataSeries::QualityScores,
                &mut quality_scores,
                record.read_length,
            )?;
            record.quality_scores = quality_scores;
        }

        record.alignment_end = record.alignment_start;
        record.mapping_quality = 0;

        Ok(())
    }

    fn record_reference_bases(
        &mut self,
        record: &Record,
        slice_reference: &SliceReference,
    ) -> io::Result<Option<ReferenceBases>> {
        match slice_reference {
            SliceReference::None => Ok(None),
            SliceReference::Single(bases) => Ok(Some(ReferenceBases {
                bases: bases.bases.clone(),
                offset: bases.offset,
            })),
            SliceReference::Multi => {
                let Some(id) = record.reference_sequence_id else {
                    return Ok(None);
                };

                let name = self.header.reference_sequence_name(id).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid reference sequence id: {id}"),
                    )
                })?;

                let bases = self
                    .reference_sequence_repository
                    .get(name)
                    .transpose()?
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("missing reference sequence: {name}"),
                        )
                    })?;

                Ok(Some(ReferenceBases { bases, offset: 1 }))
            }
        }
    }

    fn decode_features(&mut self) -> io::Result<Vec<Feature>> {
        if !self.needed.contains(DataSeriesSet::FN) {
            return Ok(Vec::new());
        }

        let feature_count = self.decode_int(DataSeries::FeatureCounts).and_then(|n| {
            usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let mut features = Vec::with_capacity(feature_count);

        if !self
            .needed
            .contains(DataSeriesSet::FC | DataSeriesSet::FP)
        {
            return Ok(features);
        }

        let mut prev_position = 0i32;

        for _ in 0..feature_count {
            let code = self.decode_byte(DataSeries::FeatureCodes)?;

            let delta = self.decode_int(DataSeries::FeaturePositionDeltas)?;
            let raw_position = prev_position.wrapping_add(delta);
            prev_position = raw_position;

            let position = usize::try_from(raw_position)
                .ok()
                .and_then(Position::new)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid feature position: {raw_position}"),
                    )
                })?;

            // Payload series outside the needed set decode as empty values;
            // this only happens when the affected fields were not requested.
            let feature = match code {
                b'b' => {
                    let bases = if self.needed.contains(DataSeriesSet::BB) {
                        self.decode_byte_array(DataSeries::StretchesOfBases)?
                    } else {
                        Vec::new()
                    };
                    Feature::Bases { position, bases }
                }
                b'q' => {
                    let quality_scores = if self.needed.contains(DataSeriesSet::QQ) {
                        self.decode_byte_array(DataSeries::StretchesOfQualityScores)?
                    } else {
                        Vec::new()
                    };
                    Feature::Scores {
                        position,
                        quality_scores,
                    }
                }
                b'B' => {
                    let base = if self.needed.contains(DataSeriesSet::BA) {
                        self.decode_byte(DataSeries::Bases)?
                    } else {
                        b'N'
                    };
                    let quality_score = if self.needed.contains(DataSeriesSet::QS) {
                        self.decode_byte(DataSeries::QualityScores)?
                    } else {
                        0xff
                    };
                    Feature::ReadBase {
                        position,
                        base,
                        quality_score,
                    }
                }
                b'X' => {
                    let code = if self.needed.contains(DataSeriesSet::BS) {
                        self.decode_byte(DataSeries::BaseSubstitutionCodes)?
                    } else {
                        0
                    };
                    Feature::Substitution { position, code }
                }
                b'I' => {
                    let bases = if self.needed.contains(DataSeriesSet::IN) {
                        self.decode_byte_array(DataSeries::InsertionBases)?
                    } else {
                        Vec::new()
                    };
                    Feature::Insertion { position, bases }
                }
                b'D' => {
                    let len = if self.needed.contains(DataSeriesSet::DL) {
                        self.decode_length(DataSeries::DeletionLengths)?
                    } else {
                        0
                    };
                    Feature::Deletion { position, len }
                }
                b'i' => {
                    let base = if self.needed.contains(DataSeriesSet::BA) {
                        self.decode_byte(DataSeries::Bases)?
                    } else {
                        b'N'
                    };
                    Feature::InsertBase { position, base }
                }
                b'Q' => {
                    let quality_score = if self.needed.contains(DataSeriesSet::QS) {
                        self.decode_byte(DataSeries::QualityScores)?
                    } else {
                        0xff
                    };
                    Feature::QualityScore {
                        position,
                        quality_score,
                    }
                }
                b'N' => {
                    let len = if self.needed.contains(DataSeriesSet::RS) {
                        self.decode_length(DataSeries::ReferenceSkipLengths)?
                    } else {
                        0
                    };
                    Feature::ReferenceSkip { position, len }
                }
                b'S' => {
                    let bases = if self.needed.contains(DataSeriesSet::SC) {
                        self.decode_byte_array(DataSeries::SoftClipBases)?
                    } else {
                        Vec::new()
                    };
                    Feature::SoftClip { position, bases }
                }
                b'P' => {
                    let len = if self.needed.contains(DataSeriesSet::PD) {
                        self.decode_length(DataSeries::PaddingLengths)?
                    } else {
                        0
                    };
                    Feature::Padding { position, len }
                }
                b'H' => {
                    let len = if self.needed.contains(DataSeriesSet::HC) {
                        self.decode_length(DataSeries::HardClipLengths)?
                    } else {
                        0
                    };
                    Feature::HardClip { position, len }
                }
                code => return Err(crate::record::feature::invalid_code(code)),
            };

            features.push(feature);
        }

        Ok(features)
    }

    fn decode_length(&mut self, data_series: DataSeries) -> io::Result<usize> {
        self.decode_int(data_series).and_then(|n| {
            usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })
    }

    fn decode_int(&mut self, data_series: DataSeries) -> io::Result<i32> {
        let encoding = integer_encoding(&self.compression_header.data_series_encodings, data_series)
            .ok_or_else(|| missing_codec(data_series))?;

        encoding.decode(&mut self.core_data_reader, &mut self.external_data_readers)
    }

    fn decode_byte(&mut self, data_series: DataSeries) -> io::Result<u8> {
        let encoding = byte_encoding(&self.compression_header.data_series_encodings, data_series)
            .ok_or_else(|| missing_codec(data_series))?;

        encoding.decode(&mut self.core_data_reader, &mut self.external_data_readers)
    }

    fn decode_byte_array(&mut self, data_series: DataSeries) -> io::Result<Vec<u8>> {
        let encoding =
            byte_array_encoding(&self.compression_header.data_series_encodings, data_series)
                .ok_or_else(|| missing_codec(data_series))?;

        encoding.decode(&mut self.core_data_reader, &mut self.external_data_readers)
    }

    fn decode_byte_run(
        &mut self,
        data_series: DataSeries,
        dst: &mut Vec<u8>,
        len: usize,
    ) -> io::Result<()> {
        let encoding = byte_encoding(&self.compression_header.data_series_encodings, data_series)
            .ok_or_else(|| missing_codec(data_series))?;

        encoding
            .get()
            .decode_exact(&mut self.core_data_reader, &mut self.external_data_readers, dst, len)
    }
}

fn validate_tag_value(ty: u8, value: &[u8]) -> io::Result<()> {
    let is_valid = match ty {
        b'A' | b'c' | b'C' => value.len() == 1,
        b's' | b'S' => value.len() == 2,
        b'i' | b'I' | b'f' => value.len() == 4,
        b'Z' | b'H' => value.last() == Some(&0x00),
        b'B' => value.len() >= 5,
        _ => false,
    };

    if is_valid {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid tag value for type {}", ty as char),
        ))
    }
}
