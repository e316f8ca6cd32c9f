//! CRAM container compression header.

pub(crate) mod data_series_encodings;
pub(crate) mod encoding;
pub(crate) mod preservation_map;
pub(crate) mod tag_encodings;

pub(crate) use self::{
    data_series_encodings::DataSeriesEncodings, encoding::Encoding,
    preservation_map::PreservationMap, tag_encodings::TagEncodings,
};

/// Per-container tables mapping each data series and tag to a codec, plus
/// the preservation map.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CompressionHeader {
    pub(crate) preservation_map: PreservationMap,
    pub(crate) data_series_encodings: DataSeriesEncodings,
    pub(crate) tag_encodings: TagEncodings,
}

impl CompressionHeader {
    pub fn new(
        preservation_map: PreservationMap,
        data_series_encodings: DataSeriesEncodings,
        tag_encodings: TagEncodings,
    ) -> Self {
        Self {
            preservation_map,
            data_series_encodings,
            tag_encodings,
        }
    }
}
