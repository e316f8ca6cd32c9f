use std::io::{self, Write};

use flate2::CrcWriter;

use ramune_sam as sam;

use super::{
    container::block::{Block, write_block},
    num::{write_i32_le, write_itf8, write_ltf8, write_u32_le},
};
use crate::{
    container::block::{CompressionMethod, ContentType},
    file_definition::{MAGIC_NUMBER, Version},
};

pub(super) fn write_file_definition<W>(writer: &mut W, version: Version) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(&MAGIC_NUMBER)?;
    writer.write_all(&[version.major(), version.minor()])?;

    let file_id = [0; 20];
    writer.write_all(&file_id)?;

    Ok(())
}

pub(super) fn write_file_header<W>(
    writer: &mut W,
    header: &sam::Header,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let text = header.text();

    let mut data = Vec::with_capacity(text.len() + 4);
    let len =
        i32::try_from(text.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_i32_le(&mut data, len)?;
    data.extend_from_slice(text);

    let block = Block {
        compression_method: CompressionMethod::None,
        content_type: ContentType::FileHeader,
        content_id: 0,
        uncompressed_size: data.len(),
        src: data,
    };

    let mut body = Vec::new();
    write_block(&mut body, &block, version)?;

    write_container_header(writer, &body, version)?;
    writer.write_all(&body)?;

    Ok(())
}

fn write_container_header<W>(writer: &mut W, body: &[u8], version: Version) -> io::Result<()>
where
    W: Write,
{
    let mut crc_writer = CrcWriter::new(writer);

    let len =
        i32::try_from(body.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_i32_le(&mut crc_writer, len)?;

    write_itf8(&mut crc_writer, 0)?; // reference sequence id
    write_itf8(&mut crc_writer, 0)?; // alignment start
    write_itf8(&mut crc_writer, 0)?; // alignment span
    write_itf8(&mut crc_writer, 0)?; // record count
    write_ltf8(&mut crc_writer, 0)?; // record counter
    write_ltf8(&mut crc_writer, 0)?; // base count
    write_itf8(&mut crc_writer, 1)?; // block count
    write_itf8(&mut crc_writer, 0)?; // landmark count

    if version.has_crc32() {
        let crc32 = crc_writer.crc().sum();
        write_u32_le(crc_writer.get_mut(), crc32)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_definition() -> io::Result<()> {
        let mut buf = Vec::new();
        write_file_definition(&mut buf, Version::V3_0)?;

        assert_eq!(&buf[0..4], b"CRAM");
        assert_eq!(&buf[4..6], [3, 0]);
        assert_eq!(buf.len(), 26);

        Ok(())
    }

    #[test]
    fn test_file_header_round_trip() -> io::Result<()> {
        let header = sam::Header::from_text(b"@SQ\tSN:sq0\tLN:8\n")?;

        let mut buf = Vec::new();
        write_file_header(&mut buf, &header, Version::V3_0)?;

        let actual =
            crate::io::reader::header::read_file_header(&mut &buf[..], Version::V3_0)?;
        assert_eq!(actual, header);

        Ok(())
    }
}
