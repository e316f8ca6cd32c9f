use std::io::{self, Read};

use flate2::CrcReader;

use ramune_sam as sam;

use super::{
    container::read_block_as,
    num::{read_i32_le, read_itf8, read_ltf8, read_u32_le},
};
use crate::{
    FileDefinition,
    container::block::ContentType,
    file_definition::{MAGIC_NUMBER, Version},
};

pub(crate) fn read_file_definition<R>(reader: &mut R) -> io::Result<FileDefinition>
where
    R: Read,
{
    let mut magic = [0; 4];
    reader.read_exact(&mut magic)?;

    if magic != MAGIC_NUMBER {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid CRAM magic number",
        ));
    }

    let mut version = [0; 2];
    reader.read_exact(&mut version)?;

    let version = Version::new(version[0], version[1]);
    version.validate()?;

    let mut file_id = [0; 20];
    reader.read_exact(&mut file_id)?;

    Ok(FileDefinition::new(version, file_id))
}

pub(crate) fn read_file_header<R>(reader: &mut R, version: Version) -> io::Result<sam::Header>
where
    R: Read,
{
    let len = read_header_container_header(reader, version)?;

    let mut src = vec![0; len];
    reader.read_exact(&mut src)?;

    read_file_header_block(&mut &src[..], version)
}

// The SAM header container's reference fields are placeholders, so, unlike
// data containers, only the body length and checksum matter.
fn read_header_container_header<R>(reader: &mut R, version: Version) -> io::Result<usize>
where
    R: Read,
{
    let mut crc_reader = CrcReader::new(reader);

    let len = read_i32_le(&mut crc_reader).and_then(|n| {
        usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let _reference_sequence_id = read_itf8(&mut crc_reader)?;
    let _alignment_start = read_itf8(&mut crc_reader)?;
    let _alignment_span = read_itf8(&mut crc_reader)?;
    let _record_count = read_itf8(&mut crc_reader)?;
    let _record_counter = read_ltf8(&mut crc_reader)?;
    let _base_count = read_ltf8(&mut crc_reader)?;
    let _block_count = read_itf8(&mut crc_reader)?;

    let landmark_count = read_itf8(&mut crc_reader)?;
    for _ in 0..landmark_count {
        let _ = read_itf8(&mut crc_reader)?;
    }

    if version.has_crc32() {
        let actual_crc32 = crc_reader.crc().sum();
        let expected_crc32 = read_u32_le(crc_reader.get_mut())?;

        if actual_crc32 != expected_crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "header container checksum mismatch",
            ));
        }
    }

    Ok(len)
}

fn read_file_header_block(src: &mut &[u8], version: Version) -> io::Result<sam::Header> {
    let block = read_block_as(src, ContentType::FileHeader, version)?;
    let buf = block.decode()?;

    let mut buf = &buf[..];

    // The header text is length-prefixed; the rest of the block is
    // reserved/padding.
    let len = read_i32_le(&mut buf).and_then(|n| {
        usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let text = buf
        .get(..len)
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

    sam::Header::from_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_definition() -> io::Result<()> {
        let mut src = Vec::new();
        src.extend_from_slice(b"CRAM");
        src.extend_from_slice(&[3, 0]);
        src.extend_from_slice(&[0x55; 20]);

        let actual = read_file_definition(&mut &src[..])?;
        let expected = FileDefinition::new(Version::V3_0, [0x55; 20]);
        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn test_read_file_definition_with_invalid_magic_number() {
        let src = b"BAM\x01\x03\x00";
        assert!(matches!(
            read_file_definition(&mut &src[..]),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_read_file_definition_with_unsupported_version() {
        let mut src = Vec::new();
        src.extend_from_slice(b"CRAM");
        src.extend_from_slice(&[1, 0]);
        src.extend_from_slice(&[0; 20]);

        assert!(read_file_definition(&mut &src[..]).is_err());
    }
}
