//! CRAM container writing.

pub(crate) mod block;
mod compression_header;
mod convert;
mod header;
pub(crate) mod slice;

use std::{collections::HashSet, io::{self, Write}, sync::Arc};

use bstr::BString;
use indexmap::IndexMap;
use ramune_bam as bam;
use ramune_sam as sam;

use self::convert::{WriteRecord, convert_record};
use crate::{
    container::{
        CompressionHeader, Header,
        block::ContentId,
        compression_header::{
            DataSeriesEncodings, Encoding, TagEncodings,
            data_series_encodings::DataSeries,
            encoding::codec::{Byte, ByteArray, Integer},
            preservation_map::{PreservationMap, tag_sets::TagSets},
            tag_encodings,
        },
    },
    record::Flags,
    reference::Repository,
    io::writer::Options,
};

/// Builds and writes one container from the given records.
pub(crate) fn write_container<W>(
    writer: &mut W,
    header: &sam::Header,
    reference_sequence_repository: &Repository,
    options: &Options,
    records: &[bam::Record],
    record_counter: u64,
) -> io::Result<()>
where
    W: Write,
{
    let references = fetch_references(header, reference_sequence_repository, records);

    let mut tag_sets = TagSets::default();
    let substitution_matrix =
        crate::container::compression_header::preservation_map::SubstitutionMatrix::default();

    let mut write_records = Vec::with_capacity(records.len());

    for record in records {
        let reference = references.as_ref().and_then(|references| {
            record
                .reference_sequence_id()
                .and_then(|id| references.get(&id))
        });

        write_records.push(convert_record(
            record,
            reference,
            &substitution_matrix,
            &mut tag_sets,
        )?);
    }

    for chunk in write_records.chunks_mut(options.records_per_slice) {
        link_mates(chunk);
    }

    let alignment_starts_are_deltas = write_records
        .chunks(options.records_per_slice)
        .all(slice::is_coordinate_sorted);

    let preservation_map = PreservationMap {
        records_have_names: true,
        alignment_starts_are_deltas,
        reference_required: references.is_some(),
        quality_scores_use_reference_orientation: true,
        substitution_matrix,
        tag_sets,
    };

    let (data_series_encodings, constant_series_ids) =
        build_data_series_encodings(&write_records);
    let tag_encodings = build_tag_encodings(&preservation_map.tag_sets);

    let mut compression_header = CompressionHeader::new(
        preservation_map,
        data_series_encodings,
        tag_encodings,
    );

    // Slices are encoded before the compression header is serialized so
    // unused data series can be dropped from it.
    let mut slices_buf = Vec::new();
    let mut slice_offsets = Vec::new();
    let mut used_content_ids = Vec::new();
    let mut block_count = 1;
    let mut slice_record_counter = record_counter;

    for chunk in write_records.chunks(options.records_per_slice) {
        slice_offsets.push(slices_buf.len());

        block_count += slice::write_slice(
            &mut slices_buf,
            &compression_header,
            header,
            reference_sequence_repository,
            options,
            chunk,
            slice_record_counter,
            &mut used_content_ids,
        )?;

        slice_record_counter += chunk.len() as u64;
    }

    let mut used: HashSet<ContentId> = used_content_ids.into_iter().collect();
    used.extend(&constant_series_ids);

    compression_header
        .data_series_encodings
        .retain_used_content_ids(&used);

    let mut body = Vec::new();
    let compression_header_len =
        compression_header::write_compression_header(&mut body, &compression_header, options.version)?;
    body.extend_from_slice(&slices_buf);

    let container_header = Header {
        reference_sequence_context: slice::reference_sequence_context(&write_records),
        record_count: write_records.len(),
        record_counter,
        base_count: write_records.iter().map(|r| r.read_length as u64).sum(),
        block_count,
        landmarks: slice_offsets
            .iter()
            .map(|offset| compression_header_len + offset)
            .collect(),
    };

    header::write_header(writer, &container_header, body.len(), options.version)?;
    writer.write_all(&body)?;

    Ok(())
}

/// Fetches every reference sequence the records map to, or `None` when any
/// is unavailable, which switches the container to reference-less encoding.
fn fetch_references(
    header: &sam::Header,
    reference_sequence_repository: &Repository,
    records: &[bam::Record],
) -> Option<IndexMap<usize, Arc<[u8]>>> {
    let mut references = IndexMap::new();

    for record in records {
        let Some(id) = record.reference_sequence_id() else {
            continue;
        };

        if record.flags().is_unmapped() || references.contains_key(&id) {
            continue;
        }

        let name = header.reference_sequence_name(id)?;
        let bases = reference_sequence_repository.get(name)?.ok()?;

        references.insert(id, bases);
    }

    Some(references)
}

/// Links paired records to downstream mates within a slice; records whose
/// mate information cannot be reconstructed from the chain are detached.
fn link_mates(records: &mut [WriteRecord]) {
    let mut groups: IndexMap<BString, Vec<usize>> = IndexMap::new();

    for (i, record) in records.iter().enumerate() {
        if record.bam_flags.is_paired() && record.name.as_slice() != b"*" {
            groups.entry(record.name.clone()).or_default().push(i);
        }
    }

    let mut linked = vec![false; records.len()];

    for indices in groups.values() {
        if indices.len() >= 2 && try_link(records, indices) {
            for &i in indices {
                linked[i] = true;
            }
        }
    }

    for (record, is_linked) in records.iter_mut().zip(&linked) {
        if !is_linked && !record.cram_flags.has_mate_downstream() {
            record.cram_flags |= Flags::DETACHED;
        }
    }
}

/// Attempts to link a name group into a mate chain, verifying the decoder
/// would reconstruct the stored mate fields; template lengths that deviate
/// from the computed convention are stored verbatim instead.
fn try_link(records: &mut [WriteRecord], indices: &[usize]) -> bool {
    let mut leftmost_start = None;
    let mut rightmost_end = None;
    let mut leftmost_count = 0;
    let mut same_reference = true;
    let shared_reference_sequence_id = records[indices[0]].reference_sequence_id;

    for &i in indices {
        match (records[i].alignment_start, leftmost_start) {
            (Some(start), None) => {
                leftmost_start = Some(start);
                leftmost_count = 1;
            }
            (Some(start), Some(leftmost)) if start < leftmost => {
                leftmost_start = Some(start);
                leftmost_count = 1;
            }
            (Some(start), Some(leftmost)) if start == leftmost => leftmost_count += 1,
            _ => {}
        }

        match (records[i].alignment_end, rightmost_end) {
            (Some(end), None) => rightmost_end = Some(end),
            (Some(end), Some(rightmost)) if end > rightmost => rightmost_end = Some(end),
            _ => {}
        }

        if records[i].reference_sequence_id != shared_reference_sequence_id {
            same_reference = false;
        }
    }

    let template_length = match (same_reference, leftmost_start, rightmost_end) {
        (true, Some(leftmost), Some(rightmost)) => {
            Some((usize::from(rightmost) + 1).saturating_sub(usize::from(leftmost)) as i32)
        }
        _ => None,
    };

    // The decoder cross-fills each record's mate fields from the next chain
    // member (cyclically), so the stored fields must match.
    for (k, &i) in indices.iter().enumerate() {
        let j = indices[(k + 1) % indices.len()];
        let mate = &records[j];

        if records[i].mate_reference_sequence_id != mate.reference_sequence_id
            || records[i].mate_alignment_start != mate.alignment_start
            || records[i].bam_flags.is_mate_unmapped() != mate.bam_flags.is_unmapped()
            || records[i].bam_flags.is_mate_reverse_complemented()
                != mate.bam_flags.is_reverse_complemented()
        {
            return false;
        }
    }

    // Chain the members and reconcile template lengths.
    for (k, &i) in indices.iter().enumerate() {
        let expected_template_length = match template_length {
            Some(n)
                if !records[i].bam_flags.is_unmapped()
                    && !records[i].bam_flags.is_mate_unmapped() =>
            {
                let is_leftmost = records[i].alignment_start == leftmost_start;

                if is_leftmost
                    && (leftmost_count == 1 || records[i].bam_flags.is_first_of_pair())
                {
                    n
                } else {
                    -n
                }
            }
            _ => 0,
        };

        if records[i].template_length != expected_template_length {
            records[i].explicit_template_length = Some(records[i].template_length);
            records[i].cram_flags |= Flags::EXPLICIT_TEMPLATE_LENGTH;
        }

        if let Some(&j) = indices.get(k + 1) {
            records[i].cram_flags |= Flags::MATE_DOWNSTREAM;
            records[i].mate_distance = Some(j - i - 1);
        }
    }

    true
}

/// Builds the container's data series encodings: every series external,
/// with container-constant series collapsed to zero-bit huffman codes.
///
/// Returns the canonical content ids of the collapsed series so they
/// survive the unused-series sweep.
fn build_data_series_encodings(records: &[WriteRecord]) -> (DataSeriesEncodings, Vec<ContentId>) {
    let mut encodings = DataSeriesEncodings::init();
    let mut constant_series_ids = Vec::new();

    let mut collapse = |data_series: DataSeries,
                        value: Option<i32>,
                        slot: &mut Option<Encoding<Integer>>| {
        if let Some(value) = value {
            *slot = Some(Encoding::new(Integer::huffman(vec![value], vec![0])));
            constant_series_ids.push(ContentId::from(data_series));
        }
    };

    collapse(
        DataSeries::BamFlags,
        constant_value(records.iter().map(|r| i32::from(u16::from(r.bam_flags)))),
        &mut encodings.bam_flags,
    );

    collapse(
        DataSeries::CramFlags,
        constant_value(records.iter().map(|r| i32::from(u8::from(r.cram_flags)))),
        &mut encodings.cram_flags,
    );

    collapse(
        DataSeries::ReadLengths,
        constant_value(records.iter().map(|r| r.read_length as i32)),
        &mut encodings.read_lengths,
    );

    collapse(
        DataSeries::TagSetIds,
        constant_value(records.iter().map(|r| r.tag_set_id as i32)),
        &mut encodings.tag_set_ids,
    );

    collapse(
        DataSeries::MappingQualities,
        constant_value(
            records
                .iter()
                .filter(|r| r.is_mapped())
                .map(|r| i32::from(r.mapping_quality)),
        ),
        &mut encodings.mapping_qualities,
    );

    (encodings, constant_series_ids)
}

fn constant_value<I>(mut values: I) -> Option<i32>
where
    I: Iterator<Item = i32>,
{
    let first = values.next()?;

    if values.all(|value| value == first) {
        Some(first)
    } else {
        None
    }
}

/// Builds a byte array length encoding for every distinct tag, keyed and
/// stored by the packed tag key.
fn build_tag_encodings(tag_sets: &TagSets) -> TagEncodings {
    let mut encodings = TagEncodings::default();

    for i in 0.. {
        let Some(set) = tag_sets.get(i) else {
            break;
        };

        for descriptor in set {
            let key = tag_encodings::key(descriptor.tag, descriptor.ty);

            encodings.entry(key).or_insert_with(|| {
                Encoding::new(ByteArray::ByteArrayLength {
                    len_encoding: Encoding::new(Integer::External {
                        block_content_id: key,
                    }),
                    value_encoding: Encoding::new(Byte::External {
                        block_content_id: key,
                    }),
                })
            });
        }
    }

    encodings
}
