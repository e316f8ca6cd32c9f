use std::io::{self, Read};

use flate2::CrcReader;

use crate::{
    container::{Header, ReferenceSequenceContext},
    file_definition::Version,
    io::reader::num::{read_i32_le, read_itf8, read_itf8_as, read_ltf8_as, read_u32_le},
};

// § 9 "End of file container" (2024-09-04).
const EOF_LENGTH: usize = 15;
// CRAM 2.x blocks carry no CRC32, shortening the EOF body by 4 bytes.
const EOF_LENGTH_V2: usize = 11;
const EOF_REFERENCE_SEQUENCE_ID: i32 = -1;
const EOF_ALIGNMENT_START: i32 = 4_542_278;
const EOF_BLOCK_COUNT: usize = 1;
const EOF_CRC32: u32 = 0x4f_d9_bd_05;

pub(crate) fn read_header<R>(
    reader: &mut R,
    header: &mut Header,
    version: Version,
) -> io::Result<usize>
where
    R: Read,
{
    match read_header_inner(reader, header, version) {
        Ok(len) => Ok(len),
        // An EOF while reading the container header means the stream ended.
        // CRAM 2.0 has no EOF container, so this is the normal end of
        // stream there.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(0),
        Err(e) => Err(e),
    }
}

fn read_header_inner<R>(
    reader: &mut R,
    header: &mut Header,
    version: Version,
) -> io::Result<usize>
where
    R: Read,
{
    let mut crc_reader = CrcReader::new(reader);

    let len = read_i32_le(&mut crc_reader).and_then(|n| {
        usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let reference_sequence_id = read_itf8(&mut crc_reader)?;
    let alignment_start = read_itf8(&mut crc_reader)?;
    let alignment_span = read_itf8(&mut crc_reader)?;

    header.record_count = read_itf8_as(&mut crc_reader)?;
    header.record_counter = read_ltf8_as(&mut crc_reader)?;
    header.base_count = read_ltf8_as(&mut crc_reader)?;
    header.block_count = read_itf8_as(&mut crc_reader)?;

    read_landmarks(&mut crc_reader, &mut header.landmarks)?;

    let is_eof = if version.has_crc32() {
        let actual_crc32 = crc_reader.crc().sum();
        let expected_crc32 = read_u32_le(crc_reader.get_mut())?;

        if actual_crc32 != expected_crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "container header checksum mismatch: expected {expected_crc32:08x}, got {actual_crc32:08x}"
                ),
            ));
        }

        len == EOF_LENGTH
            && reference_sequence_id == EOF_REFERENCE_SEQUENCE_ID
            && alignment_start == EOF_ALIGNMENT_START
            && header.block_count == EOF_BLOCK_COUNT
            && expected_crc32 == EOF_CRC32
    } else {
        len == EOF_LENGTH_V2
            && reference_sequence_id == EOF_REFERENCE_SEQUENCE_ID
            && alignment_start == EOF_ALIGNMENT_START
            && header.block_count == EOF_BLOCK_COUNT
    };

    if is_eof {
        return Ok(0);
    }

    // The EOF container's fields do not form a valid context, so this only
    // runs for data containers.
    header.reference_sequence_context = ReferenceSequenceContext::try_from((
        reference_sequence_id,
        i64::from(alignment_start),
        i64::from(alignment_span),
    ))?;

    Ok(len)
}

fn read_landmarks<R>(reader: &mut R, landmarks: &mut Vec<usize>) -> io::Result<()>
where
    R: Read,
{
    landmarks.clear();

    let n: usize = read_itf8_as(reader)?;

    for _ in 0..n {
        let pos = read_itf8_as(reader)?;
        landmarks.push(pos);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ramune_core::Position;

    use super::*;

    #[test]
    fn test_read_header() -> io::Result<()> {
        let src = [
            0x90, 0x00, 0x00, 0x00, // length = 144 bytes
            0x02, // reference sequence id = 2
            0x03, // alignment start = 3
            0x05, // alignment span = 5
            0x08, // record count = 8
            0x0d, // record counter = 13
            0x15, // base count = 21
            0x22, // block count = 34
            0x02, // landmark count = 2
            0x37, // landmarks[0] = 55
            0x59, // landmarks[1] = 89
            0x21, 0xf7, 0x9c, 0xed, // CRC32
        ];

        let mut actual = Header::default();
        let len = read_header(&mut &src[..], &mut actual, Version::V3_0)?;

        let expected = Header {
            reference_sequence_context: ReferenceSequenceContext::some(
                2,
                Position::try_from(3).unwrap(),
                Position::try_from(7).unwrap(),
            ),
            record_count: 8,
            record_counter: 13,
            base_count: 21,
            block_count: 34,
            landmarks: vec![55, 89],
        };

        assert_eq!(len, 144);
        assert_eq!(actual, expected);

        Ok(())
    }

    #[test]
    fn test_read_header_with_eof() -> io::Result<()> {
        let src = [
            0x0f, 0x00, 0x00, 0x00, // length = 15 bytes
            0xff, 0xff, 0xff, 0xff, 0x0f, // reference sequence id = -1
            0xe0, 0x45, 0x4f, 0x46, // alignment start = 4542278
            0x00, // alignment span = 0
            0x00, // record count = 0
            0x00, // record counter = 0
            0x00, // base count = 0
            0x01, // block count = 1
            0x00, // landmark count = 0
            0x05, 0xbd, 0xd9, 0x4f, // CRC32
        ];

        let mut header = Header::default();
        let len = read_header(&mut &src[..], &mut header, Version::V3_0)?;

        assert_eq!(len, 0);

        Ok(())
    }

    #[test]
    fn test_read_header_with_a_checksum_mismatch() {
        let src = [
            0x0f, 0x00, 0x00, 0x00, // length = 15 bytes
            0xff, 0xff, 0xff, 0xff, 0x0f, // reference sequence id = -1
            0xe0, 0x45, 0x4f, 0x46, // alignment start = 4542278
            0x00, // alignment span = 0
            0x00, // record count = 0
            0x00, // record counter = 0
            0x00, // base count = 0
            0x01, // block count = 1
            0x00, // landmark count = 0
            0x00, 0x00, 0x00, 0x00, // CRC32 (invalid)
        ];

        let mut header = Header::default();

        assert!(matches!(
            read_header(&mut &src[..], &mut header, Version::V3_0),
            Err(e) if e.kind() == io::ErrorKind::InvalidData,
        ));
    }

    #[test]
    fn test_read_header_at_end_of_stream() -> io::Result<()> {
        let src = [];
        let mut header = Header::default();
        assert_eq!(read_header(&mut &src[..], &mut header, Version::V3_0)?, 0);
        Ok(())
    }
}
