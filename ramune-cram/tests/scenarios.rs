mod common;

use std::io;

use bstr::ByteSlice;
use ramune_sam::{
    Flags,
    cigar::{Op, op::Kind},
};

use self::common::*;

// A file holding only the EOF container yields no records.
#[test]
fn test_empty_stream() -> io::Result<()> {
    let src = write_cram(&header(), &repository(), &[], |builder| builder)?;
    let records = read_cram(&src, &repository(), |builder| builder)?;

    assert!(records.is_empty());

    Ok(())
}

#[test]
fn test_single_unmapped_read() -> io::Result<()> {
    let record = RecordBuilder::unmapped("r1", b"ACGT")
        .quality_scores(&[30, 30, 30, 30])
        .build();

    let src = write_cram(&header(), &repository(), &[record], |builder| builder)?;
    let records = read_cram(&src, &repository(), |builder| builder)?;

    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.name().map(|name| name.as_bytes()), Some(&b"r1"[..]));
    assert!(record.bam_flags().is_unmapped());
    assert_eq!(record.sequence(), b"ACGT");
    assert_eq!(record.quality_scores(), [30, 30, 30, 30]);
    assert_eq!(record.template_length(), 0);
    assert!(record.mate_reference_sequence_id().is_none());
    assert!(record.mate_alignment_start().is_none());

    Ok(())
}

#[test]
fn test_paired_mapped_reads_cross_fill_mates() -> io::Result<()> {
    let first = RecordBuilder::mapped("p0", 0, 1, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .flags(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::FIRST_OF_PAIR)
        .mate(Some(0), Some(21), 25)
        .build();

    let last = RecordBuilder::mapped("p0", 0, 21, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .flags(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::LAST_OF_PAIR)
        .mate(Some(0), Some(1), -25)
        .build();

    let src = write_cram(&header(), &repository(), &[first, last], |builder| builder)?;
    let records = read_cram(&src, &repository(), |builder| builder)?;

    assert_eq!(records.len(), 2);

    assert_eq!(records[0].template_length(), 25);
    assert_eq!(records[1].template_length(), -25);

    assert_eq!(
        records[0].mate_alignment_start().map(usize::from),
        Some(21)
    );
    assert_eq!(records[1].mate_alignment_start().map(usize::from), Some(1));
    assert_eq!(records[0].mate_reference_sequence_id(), Some(0));
    assert_eq!(records[1].mate_reference_sequence_id(), Some(0));

    assert!(records[0].bam_flags().contains(Flags::PROPERLY_PAIRED));
    assert!(records[1].bam_flags().contains(Flags::PROPERLY_PAIRED));

    Ok(())
}

// A mismatch stored as a substitution code resolves through the matrix and
// feeds the generated MD/NM tags.
#[test]
fn test_substitution_with_md_generation() -> io::Result<()> {
    // sq0 position 9 is A; the read calls C.
    let record = RecordBuilder::mapped("r0", 0, 9, &[Op::new(Kind::Match, 1)])
        .sequence(b"C")
        .build();

    let src = write_cram(&header(), &repository(), &[record], |builder| builder)?;

    let records = read_cram(&src, &repository(), |builder| builder.set_decode_md(true))?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sequence(), b"C");

    // MD lists the reference base at the mismatch; NM counts it.
    let data = records[0].data();
    assert!(
        data.windows(7).any(|w| w == b"MDZ0A0\x00"),
        "missing MD tag in {:?}",
        data.as_bstr()
    );
    assert!(
        data.windows(7)
            .any(|w| w == b"NMi\x01\x00\x00\x00"),
        "missing NM tag in {:?}",
        data.as_bstr()
    );

    Ok(())
}

// A container-constant series collapses to a zero-bit huffman code, so
// every record's flags decode without consuming any input.
#[test]
fn test_constant_series_collapse_to_zero_bit_codes() -> io::Result<()> {
    let records: Vec<_> = (0..4)
        .map(|i| {
            RecordBuilder::unmapped(&format!("r{i}"), b"ACGT")
                .quality_scores(&[30; 4])
                .build()
        })
        .collect();

    let src = write_cram(&header(), &repository(), &records, |builder| builder)?;
    let decoded = read_cram(&src, &repository(), |builder| builder)?;

    assert_eq!(decoded.len(), 4);

    for record in &decoded {
        assert_eq!(u16::from(record.bam_flags()), 0x04);
    }

    Ok(())
}

#[test]
fn test_range_query_skips_non_overlapping_records() -> io::Result<()> {
    use ramune_core::Position;
    use ramune_cram::io::reader::Range;

    let records: Vec<_> = (0..8)
        .map(|i| {
            RecordBuilder::mapped(&format!("r{i}"), 0, 4 * i + 1, &[Op::new(Kind::Match, 4)])
                .sequence(b"NNNN")
                .build()
        })
        .collect();

    let src = write_cram(&header(), &repository(), &records, |builder| {
        builder.set_records_per_slice(4)
    })?;

    let range = Range::new(
        0,
        Position::try_from(10).unwrap(),
        Position::try_from(18).unwrap(),
    );

    let decoded = read_cram(&src, &repository(), |builder| builder.set_range(range))?;

    // Reads start at 1, 5, ..., 29; those overlapping [10, 18] start at
    // 9, 13, and 17.
    let starts: Vec<_> = decoded
        .iter()
        .filter_map(|record| record.alignment_start())
        .map(usize::from)
        .collect();

    assert_eq!(starts, [9, 13, 17]);

    Ok(())
}

#[test]
fn test_decode_skips_unneeded_blocks() -> io::Result<()> {
    use ramune_cram::io::reader::RequiredFields;

    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 4)])
            .sequence(b"ACGT")
            .quality_scores(&[30; 4])
            .data(b"NHC\x01")
            .build(),
    ];

    let src = write_cram(&header(), &repository(), &records, |builder| builder)?;

    let decoded = read_cram(&src, &repository(), |builder| {
        builder.set_required_fields(RequiredFields::FLAGS | RequiredFields::ALIGNMENT_START)
    })?;

    assert_eq!(decoded.len(), 1);
    assert_eq!(
        decoded[0].alignment_start().map(usize::from),
        Some(1)
    );
    // Skipped fields fall back to their defaults.
    assert!(decoded[0].data().is_empty());

    Ok(())
}
