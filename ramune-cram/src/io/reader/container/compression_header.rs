pub(crate) mod data_series_encodings;
pub(crate) mod encoding;
pub(crate) mod preservation_map;
pub(crate) mod tag_encodings;

use std::io;

use self::{
    data_series_encodings::read_data_series_encodings, preservation_map::read_preservation_map,
    tag_encodings::read_tag_encodings,
};
use super::read_block_as;
use crate::{
    container::{CompressionHeader, block::ContentType},
    file_definition::Version,
};

pub(crate) fn read_compression_header(
    src: &mut &[u8],
    version: Version,
) -> io::Result<CompressionHeader> {
    let block = read_block_as(src, ContentType::CompressionHeader, version)?;
    let buf = block.decode()?;
    read_compression_header_inner(&mut &buf[..], version)
}

fn read_compression_header_inner(
    src: &mut &[u8],
    version: Version,
) -> io::Result<CompressionHeader> {
    // Transform codec instances get ids for the slice-scoped expansion
    // cache, assigned in parse order.
    let mut codec_ids = 0;

    let preservation_map = read_preservation_map(src)?;
    let data_series_encodings = read_data_series_encodings(src, version, &mut codec_ids)?;
    let tag_encodings = read_tag_encodings(src, version, &mut codec_ids)?;

    Ok(CompressionHeader::new(
        preservation_map,
        data_series_encodings,
        tag_encodings,
    ))
}
