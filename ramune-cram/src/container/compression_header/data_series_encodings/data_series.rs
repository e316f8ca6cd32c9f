use std::{error, fmt};

use crate::container::block;

/// A two-letter named data series.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DataSeries {
    /// BAM flags (`BF`).
    BamFlags,
    /// CRAM flags (`CF`).
    CramFlags,
    /// Reference sequence ids (`RI`).
    ReferenceSequenceIds,
    /// Read lengths (`RL`).
    ReadLengths,
    /// Alignment starts (`AP`).
    AlignmentStarts,
    /// Read group ids (`RG`).
    ReadGroupIds,
    /// Read names (`RN`).
    Names,
    /// Mate flags (`MF`).
    MateFlags,
    /// Mate reference sequence ids (`NS`).
    MateReferenceSequenceIds,
    /// Mate alignment starts (`NP`).
    MateAlignmentStarts,
    /// Template lengths (`TS`).
    TemplateLengths,
    /// Mate distances (`NF`).
    MateDistances,
    /// Tag set ids (`TL`).
    TagSetIds,
    /// Feature counts (`FN`).
    FeatureCounts,
    /// Feature codes (`FC`).
    FeatureCodes,
    /// Feature position deltas (`FP`).
    FeaturePositionDeltas,
    /// Deletion lengths (`DL`).
    DeletionLengths,
    /// Stretches of bases (`BB`).
    StretchesOfBases,
    /// Stretches of quality scores (`QQ`).
    StretchesOfQualityScores,
    /// Base substitution codes (`BS`).
    BaseSubstitutionCodes,
    /// Insertion bases (`IN`).
    InsertionBases,
    /// Reference skip lengths (`RS`).
    ReferenceSkipLengths,
    /// Padding lengths (`PD`).
    PaddingLengths,
    /// Hard clip lengths (`HC`).
    HardClipLengths,
    /// Soft clip bases (`SC`).
    SoftClipBases,
    /// Mapping qualities (`MQ`).
    MappingQualities,
    /// Bases (`BA`).
    Bases,
    /// Quality scores (`QS`).
    QualityScores,
}

/// An error returned when a byte pair is not a known data series name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TryFromBytesError([u8; 2]);

impl error::Error for TryFromBytesError {}

impl fmt::Display for TryFromBytesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown data series: {}{}",
            self.0[0] as char, self.0[1] as char
        )
    }
}

impl TryFrom<[u8; 2]> for DataSeries {
    type Error = TryFromBytesError;

    fn try_from(b: [u8; 2]) -> Result<Self, Self::Error> {
        match &b {
            b"BF" => Ok(Self::BamFlags),
            b"CF" => Ok(Self::CramFlags),
            b"RI" => Ok(Self::ReferenceSequenceIds),
            b"RL" => Ok(Self::ReadLengths),
            b"AP" => Ok(Self::AlignmentStarts),
            b"RG" => Ok(Self::ReadGroupIds),
            b"RN" => Ok(Self::Names),
            b"MF" => Ok(Self::MateFlags),
            b"NS" => Ok(Self::MateReferenceSequenceIds),
            b"NP" => Ok(Self::MateAlignmentStarts),
            b"TS" => Ok(Self::TemplateLengths),
            b"NF" => Ok(Self::MateDistances),
            b"TL" => Ok(Self::TagSetIds),
            b"FN" => Ok(Self::FeatureCounts),
            b"FC" => Ok(Self::FeatureCodes),
            b"FP" => Ok(Self::FeaturePositionDeltas),
            b"DL" => Ok(Self::DeletionLengths),
            b"BB" => Ok(Self::StretchesOfBases),
            b"QQ" => Ok(Self::StretchesOfQualityScores),
            b"BS" => Ok(Self::BaseSubstitutionCodes),
            b"IN" => Ok(Self::InsertionBases),
            b"RS" => Ok(Self::ReferenceSkipLengths),
            b"PD" => Ok(Self::PaddingLengths),
            b"HC" => Ok(Self::HardClipLengths),
            b"SC" => Ok(Self::SoftClipBases),
            b"MQ" => Ok(Self::MappingQualities),
            b"BA" => Ok(Self::Bases),
            b"QS" => Ok(Self::QualityScores),
            _ => Err(TryFromBytesError(b)),
        }
    }
}

impl From<DataSeries> for [u8; 2] {
    fn from(data_series: DataSeries) -> Self {
        match data_series {
            DataSeries::BamFlags => *b"BF",
            DataSeries::CramFlags => *b"CF",
            DataSeries::ReferenceSequenceIds => *b"RI",
            DataSeries::ReadLengths => *b"RL",
            DataSeries::AlignmentStarts => *b"AP",
            DataSeries::ReadGroupIds => *b"RG",
            DataSeries::Names => *b"RN",
            DataSeries::MateFlags => *b"MF",
            DataSeries::MateReferenceSequenceIds => *b"NS",
            DataSeries::MateAlignmentStarts => *b"NP",
            DataSeries::TemplateLengths => *b"TS",
            DataSeries::MateDistances => *b"NF",
            DataSeries::TagSetIds => *b"TL",
            DataSeries::FeatureCounts => *b"FN",
            DataSeries::FeatureCodes => *b"FC",
            DataSeries::FeaturePositionDeltas => *b"FP",
            DataSeries::DeletionLengths => *b"DL",
            DataSeries::StretchesOfBases => *b"BB",
            DataSeries::StretchesOfQualityScores => *b"QQ",
            DataSeries::BaseSubstitutionCodes => *b"BS",
            DataSeries::InsertionBases => *b"IN",
            DataSeries::ReferenceSkipLengths => *b"RS",
            DataSeries::PaddingLengths => *b"PD",
            DataSeries::HardClipLengths => *b"HC",
            DataSeries::SoftClipBases => *b"SC",
            DataSeries::MappingQualities => *b"MQ",
            DataSeries::Bases => *b"BA",
            DataSeries::QualityScores => *b"QS",
        }
    }
}

impl From<DataSeries> for block::ContentId {
    fn from(data_series: DataSeries) -> Self {
        data_series as block::ContentId + 1
    }
}
