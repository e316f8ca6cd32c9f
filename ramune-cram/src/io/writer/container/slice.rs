mod header;
pub(crate) mod records;

use std::io;

use md5::{Digest, Md5};
use ramune_core::Position;
use ramune_sam as sam;

use self::records::SliceRecordWriter;
use super::convert::WriteRecord;
use crate::{
    container::{
        CompressionHeader, ReferenceSequenceContext,
        block::{ContentId, ContentType},
        compression_header::data_series_encodings::DataSeries,
        slice,
    },
    io::writer::{Options, container::block::Block},
    reference::Repository,
};

/// Computes the reference sequence context the given records share.
pub(super) fn reference_sequence_context(records: &[WriteRecord]) -> ReferenceSequenceContext {
    let mut context: Option<ReferenceSequenceContext> = None;

    for record in records {
        let record_context = match (record.reference_sequence_id, record.alignment_start) {
            (Some(id), Some(start)) => {
                let end = record.alignment_end.unwrap_or(start);
                ReferenceSequenceContext::some(id, start, end)
            }
            _ => ReferenceSequenceContext::None,
        };

        context = Some(match (context, record_context) {
            (None, c) => c,
            (
                Some(ReferenceSequenceContext::Some {
                    reference_sequence_id: a,
                    alignment_start: a_start,
                    alignment_end: a_end,
                }),
                ReferenceSequenceContext::Some {
                    reference_sequence_id: b,
                    alignment_start: b_start,
                    alignment_end: b_end,
                },
            ) if a == b => ReferenceSequenceContext::some(
                a,
                a_start.min(b_start),
                a_end.max(b_end),
            ),
            (Some(ReferenceSequenceContext::None), ReferenceSequenceContext::None) => {
                ReferenceSequenceContext::None
            }
            _ => ReferenceSequenceContext::Many,
        });
    }

    context.unwrap_or_default()
}

/// Encodes one slice: its header block, core bitstream block, and external
/// blocks.
///
/// Returns the number of blocks written.
#[allow(clippy::too_many_arguments)]
pub(super) fn write_slice(
    dst: &mut Vec<u8>,
    compression_header: &CompressionHeader,
    header: &sam::Header,
    reference_sequence_repository: &Repository,
    options: &Options,
    records: &[WriteRecord],
    record_counter: u64,
    used_content_ids: &mut Vec<ContentId>,
) -> io::Result<usize> {
    let context = reference_sequence_context(records);

    let mut record_writer = SliceRecordWriter::new(compression_header, context);

    for record in records {
        record_writer.write_record(record)?;
    }

    let core_data = record_writer.core_data_writer.finish()?;

    let mut external_blocks = Vec::new();

    for (id, data) in record_writer.external_data_writers {
        if data.is_empty() {
            continue;
        }

        used_content_ids.push(id);

        let is_read_names = id == ContentId::from(DataSeries::Names);
        external_blocks.push(Block::external(options, id, is_read_names, data)?);
    }

    let reference_md5 = slice_reference_md5(
        compression_header,
        header,
        reference_sequence_repository,
        context,
    );

    let slice_header = slice::Header {
        reference_sequence_context: context,
        record_count: records.len(),
        record_counter,
        block_count: 1 + external_blocks.len(),
        block_content_ids: external_blocks.iter().map(|b| b.content_id).collect(),
        embedded_reference_bases_block_content_id: None,
        reference_md5,
        optional_tags: Vec::new(),
    };

    header::write_header(dst, &slice_header, options.version)?;

    let core_data_block = Block::raw(ContentType::CoreData, 0, core_data);
    super::block::write_block(dst, &core_data_block, options.version)?;

    for external_block in &external_blocks {
        super::block::write_block(dst, external_block, options.version)?;
    }

    // slice header + core + externals
    Ok(2 + external_blocks.len())
}

fn slice_reference_md5(
    compression_header: &CompressionHeader,
    header: &sam::Header,
    reference_sequence_repository: &Repository,
    context: ReferenceSequenceContext,
) -> Option<[u8; 16]> {
    if !compression_header.preservation_map.reference_required() {
        return None;
    }

    let ReferenceSequenceContext::Some {
        reference_sequence_id,
        alignment_start,
        alignment_end,
    } = context
    else {
        return None;
    };

    let name = header.reference_sequence_name(reference_sequence_id)?;
    let bases = reference_sequence_repository.get(name)?.ok()?;

    let start = usize::from(alignment_start);
    let end = usize::from(alignment_end).min(bases.len());

    let mut hasher = Md5::new();

    if start <= end {
        hasher.update(&bases[start - 1..end]);
    }

    let digest: [u8; 16] = hasher.finalize().into();

    Some(digest)
}

/// Returns whether every record is placed on one reference in
/// non-decreasing position order, making delta-coded alignment starts
/// valid.
pub(super) fn is_coordinate_sorted(records: &[WriteRecord]) -> bool {
    if !matches!(
        reference_sequence_context(records),
        ReferenceSequenceContext::Some { .. }
    ) {
        return false;
    }

    let mut last: Option<Position> = None;

    for record in records {
        let Some(start) = record.alignment_start else {
            return false;
        };

        if let Some(last) = last {
            if start < last {
                return false;
            }
        }

        last = Some(start);
    }

    true
}
