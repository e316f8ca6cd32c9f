use std::io::{self, Write};

use super::super::block::{Block, write_block};
use crate::{
    container::{block::ContentType, slice::Header},
    file_definition::Version,
    io::writer::num::{write_itf8, write_ltf8},
};

pub(super) fn write_header<W>(writer: &mut W, header: &Header, version: Version) -> io::Result<()>
where
    W: Write,
{
    let mut buf = Vec::new();

    write_itf8(&mut buf, header.reference_sequence_context.raw_reference_sequence_id())?;
    write_itf8(&mut buf, header.reference_sequence_context.raw_alignment_start())?;

    let alignment_span =
        i32::try_from(header.reference_sequence_context.alignment_span())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut buf, alignment_span)?;

    let record_count = i32::try_from(header.record_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut buf, record_count)?;

    let record_counter = i64::try_from(header.record_counter)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    if version.has_long_record_counter() {
        write_ltf8(&mut buf, record_counter)?;
    } else {
        let n = i32::try_from(record_counter)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_itf8(&mut buf, n)?;
    }

    let block_count = i32::try_from(header.block_count)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut buf, block_count)?;

    let block_content_id_count = i32::try_from(header.block_content_ids.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_itf8(&mut buf, block_content_id_count)?;

    for &id in &header.block_content_ids {
        write_itf8(&mut buf, id)?;
    }

    let embedded_reference_bases_block_content_id = header
        .embedded_reference_bases_block_content_id
        .unwrap_or(-1);
    write_itf8(&mut buf, embedded_reference_bases_block_content_id)?;

    buf.write_all(&header.reference_md5.unwrap_or_default())?;
    buf.write_all(&header.optional_tags)?;

    let block = Block::raw(ContentType::SliceHeader, 0, buf);
    write_block(writer, &block, version)
}
