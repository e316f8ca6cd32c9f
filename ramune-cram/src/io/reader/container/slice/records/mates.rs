//! Intra-slice mate resolution.

use std::io;

use ramune_sam as sam;

use crate::{io::reader::RequiredFields, record::Record};

/// Resolves mate links between the records of a slice.
///
/// Records with a downstream mate form chains; each chain is walked once to
/// compute the union alignment span and assign signed template lengths, and
/// mate positions are cross-filled from the linked records. Detached
/// records keep their stored mate fields.
///
/// Returns, for each record, the index of its chain leader (used for
/// generated read names).
pub(super) fn resolve(
    records: &mut [Record],
    required_fields: RequiredFields,
) -> io::Result<Vec<usize>> {
    let record_count = records.len();

    let mut chain_leaders: Vec<usize> = (0..record_count).collect();

    if !required_fields.intersects(
        RequiredFields::MATE_REFERENCE_SEQUENCE_ID
            | RequiredFields::MATE_ALIGNMENT_START
            | RequiredFields::TEMPLATE_LENGTH,
    ) {
        for record in records.iter_mut() {
            record.template_length = 0;
            record.mate_alignment_start = None;
            record.mate_reference_sequence_id = None;
        }

        return Ok(chain_leaders);
    }

    // Next-record links; a chain's final record points back to its head
    // once the chain has been walked.
    let mut links: Vec<Option<usize>> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record
                .mate_distance
                .map(|distance| i + distance + 1)
        })
        .collect();

    let mut template_lengths: Vec<Option<i32>> = vec![None; record_count];

    for i in 0..record_count {
        let Some(mate_index) = links[i] else {
            // No intra-slice mate: the stored mate fields stand.
            let record = &mut records[i];

            if record.mate_flags.is_on_negative_strand() {
                record.bam_flags |=
                    sam::Flags::PAIRED | sam::Flags::MATE_REVERSE_COMPLEMENTED;
            }

            if record.mate_flags.is_unmapped() {
                record.bam_flags |= sam::Flags::MATE_UNMAPPED;
            }

            if !record.bam_flags.is_paired() {
                record.mate_reference_sequence_id = None;
            }

            continue;
        };

        if mate_index >= record_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("mate index out of bounds: {mate_index} >= {record_count}"),
            ));
        }

        if template_lengths[i].is_none() {
            walk_chain(records, &mut links, &mut template_lengths, &mut chain_leaders, i)?;
        }

        let mate_index = links[i].unwrap_or(i);

        records[i].mate_alignment_start = records[mate_index].alignment_start;
        records[i].mate_reference_sequence_id = records[mate_index].reference_sequence_id;

        records[i].bam_flags |= sam::Flags::PAIRED;

        if let Some(template_length) = template_lengths[i] {
            records[i].template_length = template_length;
        }

        if records[mate_index].bam_flags.is_unmapped() {
            records[i].bam_flags |= sam::Flags::MATE_UNMAPPED;
            records[i].template_length = 0;
        }

        if records[i].bam_flags.is_unmapped() {
            records[i].template_length = 0;
        }

        if records[mate_index].bam_flags.is_reverse_complemented() {
            records[i].bam_flags |= sam::Flags::MATE_REVERSE_COMPLEMENTED;
        }
    }

    // Verbatim template lengths override the computed ones.
    for record in records.iter_mut() {
        if let Some(n) = record.explicit_template_length {
            record.template_length = n;
        }
    }

    Ok(chain_leaders)
}

/// Walks a mate chain once, closing it into a cycle and computing the
/// signed template length for every member.
fn walk_chain(
    records: &mut [Record],
    links: &mut [Option<usize>],
    template_lengths: &mut [Option<i32>],
    chain_leaders: &mut [usize],
    head: usize,
) -> io::Result<()> {
    let record_count = records.len();

    let mut leftmost_start = records[head].alignment_start;
    let mut rightmost_end = records[head].alignment_end;
    let mut shared_reference_sequence_id = records[head].reference_sequence_id;
    let mut same_reference = true;

    // Count of records sharing the leftmost start, for the tie-break below.
    let mut leftmost_count = 1;

    let mut members = vec![head];
    let mut i = head;

    loop {
        let Some(next) = links[i] else {
            // The chain ends here; close it into a cycle.
            links[i] = Some(head);
            break;
        };

        if next <= i || next >= record_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid mate chain link: {i} -> {next}"),
            ));
        }

        i = next;
        members.push(i);

        match (records[i].alignment_start, leftmost_start) {
            (Some(start), Some(leftmost)) if start < leftmost => {
                leftmost_start = Some(start);
                leftmost_count = 1;
            }
            (Some(start), Some(leftmost)) if start == leftmost => leftmost_count += 1,
            (Some(start), None) => {
                leftmost_start = Some(start);
                leftmost_count = 1;
            }
            _ => {}
        }

        if let (Some(end), Some(rightmost)) = (records[i].alignment_end, rightmost_end) {
            if end > rightmost {
                rightmost_end = Some(end);
            }
        } else if rightmost_end.is_none() {
            rightmost_end = records[i].alignment_end;
        }

        if records[i].reference_sequence_id != shared_reference_sequence_id {
            same_reference = false;
        }
    }

    for &member in &members {
        chain_leaders[member] = head;
    }

    let template_length = match (same_reference, leftmost_start, rightmost_end) {
        (true, Some(leftmost), Some(rightmost)) => {
            Some((usize::from(rightmost) + 1).saturating_sub(usize::from(leftmost)) as i32)
        }
        _ => None,
    };

    for &member in &members {
        let signed = match template_length {
            Some(n) => {
                let is_leftmost = records[member].alignment_start == leftmost_start;

                if is_leftmost
                    && (leftmost_count == 1
                        || records[member].bam_flags.is_first_of_pair())
                {
                    n
                } else {
                    -n
                }
            }
            None => 0,
        };

        template_lengths[member] = Some(signed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ramune_core::Position;

    use super::*;
    use crate::record::MateFlags;

    fn mapped_record(start: usize, end: usize, flags: sam::Flags) -> Record {
        let mut record = Record::default();
        record.bam_flags = flags;
        record.reference_sequence_id = Some(0);
        record.alignment_start = Position::new(start);
        record.alignment_end = Position::new(end);
        record
    }

    #[test]
    fn test_resolve_pair() -> io::Result<()> {
        let mut records = vec![
            mapped_record(100, 104, sam::Flags::FIRST_OF_PAIR),
            mapped_record(200, 204, sam::Flags::LAST_OF_PAIR),
        ];

        records[0].mate_distance = Some(0);

        resolve(&mut records, RequiredFields::all())?;

        assert_eq!(records[0].template_length, 105);
        assert_eq!(records[1].template_length, -105);

        assert_eq!(records[0].mate_alignment_start, Position::new(200));
        assert_eq!(records[1].mate_alignment_start, Position::new(100));
        assert_eq!(records[0].mate_reference_sequence_id, Some(0));
        assert_eq!(records[1].mate_reference_sequence_id, Some(0));

        assert!(records[0].bam_flags.is_paired());
        assert!(records[1].bam_flags.is_paired());

        Ok(())
    }

    #[test]
    fn test_resolve_pair_with_mate_reverse() -> io::Result<()> {
        let mut records = vec![
            mapped_record(100, 104, sam::Flags::FIRST_OF_PAIR),
            mapped_record(
                200,
                204,
                sam::Flags::LAST_OF_PAIR | sam::Flags::REVERSE_COMPLEMENTED,
            ),
        ];

        records[0].mate_distance = Some(0);

        resolve(&mut records, RequiredFields::all())?;

        assert!(records[0].bam_flags.is_mate_reverse_complemented());
        assert!(!records[1].bam_flags.is_mate_reverse_complemented());

        Ok(())
    }

    #[test]
    fn test_resolve_detached_record() -> io::Result<()> {
        let mut records = vec![mapped_record(
            100,
            104,
            sam::Flags::PAIRED | sam::Flags::FIRST_OF_PAIR,
        )];

        records[0].mate_flags = MateFlags::ON_NEGATIVE_STRAND;
        records[0].mate_reference_sequence_id = Some(0);
        records[0].mate_alignment_start = Position::new(200);
        records[0].template_length = 105;

        resolve(&mut records, RequiredFields::all())?;

        assert!(records[0].bam_flags.is_mate_reverse_complemented());
        assert_eq!(records[0].mate_alignment_start, Position::new(200));
        assert_eq!(records[0].template_length, 105);

        Ok(())
    }

    #[test]
    fn test_resolve_with_explicit_template_length() -> io::Result<()> {
        let mut records = vec![
            mapped_record(100, 104, sam::Flags::FIRST_OF_PAIR),
            mapped_record(200, 204, sam::Flags::LAST_OF_PAIR),
        ];

        records[0].mate_distance = Some(0);
        records[0].explicit_template_length = Some(42);

        resolve(&mut records, RequiredFields::all())?;

        assert_eq!(records[0].template_length, 42);
        assert_eq!(records[1].template_length, -105);

        Ok(())
    }

    #[test]
    fn test_resolve_with_out_of_bounds_mate() {
        let mut records = vec![mapped_record(100, 104, sam::Flags::FIRST_OF_PAIR)];
        records[0].mate_distance = Some(13);

        assert!(resolve(&mut records, RequiredFields::all()).is_err());
    }

    #[test]
    fn test_resolve_with_tie_broken_by_first_of_pair() -> io::Result<()> {
        let mut records = vec![
            mapped_record(100, 104, sam::Flags::LAST_OF_PAIR),
            mapped_record(100, 104, sam::Flags::FIRST_OF_PAIR),
        ];

        records[0].mate_distance = Some(0);

        resolve(&mut records, RequiredFields::all())?;

        assert_eq!(records[0].template_length, -5);
        assert_eq!(records[1].template_length, 5);

        Ok(())
    }
}
