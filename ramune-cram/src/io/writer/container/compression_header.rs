mod data_series_encodings;
mod encoding;
mod preservation_map;
mod tag_encodings;

use std::io::{self, Write};

use self::{
    data_series_encodings::write_data_series_encodings,
    preservation_map::write_preservation_map, tag_encodings::write_tag_encodings,
};
use super::block::{Block, write_block};
use crate::{
    container::{CompressionHeader, block::ContentType},
    file_definition::Version,
};

pub(super) fn write_compression_header<W>(
    writer: &mut W,
    compression_header: &CompressionHeader,
    version: Version,
) -> io::Result<usize>
where
    W: Write,
{
    let mut buf = Vec::new();

    write_preservation_map(&mut buf, &compression_header.preservation_map)?;
    write_data_series_encodings(&mut buf, &compression_header.data_series_encodings)?;
    write_tag_encodings(&mut buf, &compression_header.tag_encodings)?;

    let block = Block::raw(ContentType::CompressionHeader, 0, buf);
    let size = block.size(version)?;

    write_block(writer, &block, version)?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::reader::container::read_compression_header;

    #[test]
    fn test_round_trip() -> io::Result<()> {
        let mut compression_header = CompressionHeader::default();
        compression_header.data_series_encodings =
            crate::container::compression_header::DataSeriesEncodings::init();

        let mut buf = Vec::new();
        let size =
            write_compression_header(&mut buf, &compression_header, Version::V3_0)?;
        assert_eq!(size, buf.len());

        let actual = read_compression_header(&mut &buf[..], Version::V3_0)?;
        assert_eq!(actual, compression_header);

        Ok(())
    }
}
