use std::io::{self, Write};

use flate2::CrcWriter;

use crate::{
    container::Header,
    file_definition::Version,
    io::writer::num::{write_i32_le, write_itf8, write_ltf8, write_u32_le},
};

pub(super) fn write_header<W>(
    writer: &mut W,
    header: &Header,
    body_len: usize,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let mut crc_writer = CrcWriter::new(writer);

    let len =
        i32::try_from(body_len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_i32_le(&mut crc_writer, len)?;

    write_itf8(
        &mut crc_writer,
        header.reference_sequence_context.raw_reference_sequence_id(),
    )?;
    write_itf8(
        &mut crc_writer,
        header.reference_sequence_context.raw_alignment_start(),
    )?;

    let alignment_span = i32::try_from(header.reference_sequence_context.alignment_span())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut crc_writer, alignment_span)?;

    let record_count = i32::try_from(header.record_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut crc_writer, record_count)?;

    let record_counter = i64::try_from(header.record_counter)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_ltf8(&mut crc_writer, record_counter)?;

    let base_count = i64::try_from(header.base_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_ltf8(&mut crc_writer, base_count)?;

    let block_count = i32::try_from(header.block_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut crc_writer, block_count)?;

    let landmark_count = i32::try_from(header.landmarks.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut crc_writer, landmark_count)?;

    for &landmark in &header.landmarks {
        let n = i32::try_from(landmark)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_itf8(&mut crc_writer, n)?;
    }

    if version.has_crc32() {
        let crc32 = crc_writer.crc().sum();
        write_u32_le(crc_writer.get_mut(), crc32)?;
    }

    Ok(())
}
