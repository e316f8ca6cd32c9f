mod common;

use std::io;

use ramune_cram::file_definition::Version;
use ramune_sam::{
    Flags,
    cigar::{Op, op::Kind},
};

use self::common::*;

#[test]
fn test_unmapped_records_round_trip() -> io::Result<()> {
    let records = vec![
        RecordBuilder::unmapped("r0", b"ACGT")
            .quality_scores(&[30, 30, 30, 30])
            .build(),
        RecordBuilder::unmapped("r1", b"TTGGA").build(),
        RecordBuilder::unmapped("r2", b"NNN")
            .data(b"NHC\x01")
            .build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}

#[test]
fn test_mapped_records_round_trip() -> io::Result<()> {
    // sq0 repeats ACGT; reads at 1 and 5 match, the third carries a
    // substitution (ref A at 9 read as G).
    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 8)])
            .sequence(b"ACGTACGT")
            .quality_scores(&[40; 8])
            .build(),
        RecordBuilder::mapped("r1", 0, 5, &[Op::new(Kind::Match, 4)])
            .sequence(b"ACGT")
            .quality_scores(&[41, 42, 43, 44])
            .build(),
        RecordBuilder::mapped("r2", 0, 9, &[Op::new(Kind::Match, 4)])
            .sequence(b"GCGT")
            .quality_scores(&[20; 4])
            .build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}

#[test]
fn test_complex_cigars_round_trip() -> io::Result<()> {
    let records = vec![
        RecordBuilder::mapped(
            "r0",
            0,
            2,
            &[
                Op::new(Kind::SoftClip, 2),
                Op::new(Kind::Match, 4),
                Op::new(Kind::Insertion, 2),
                Op::new(Kind::Match, 2),
            ],
        )
        .sequence(b"NNCGTATTCG")
        .quality_scores(&[30; 10])
        .build(),
        RecordBuilder::mapped(
            "r1",
            0,
            1,
            &[
                Op::new(Kind::Match, 4),
                Op::new(Kind::Deletion, 2),
                Op::new(Kind::Match, 2),
            ],
        )
        .sequence(b"ACGTCG")
        .quality_scores(&[25; 6])
        .build(),
        RecordBuilder::mapped(
            "r2",
            0,
            3,
            &[
                Op::new(Kind::HardClip, 3),
                Op::new(Kind::Match, 2),
                Op::new(Kind::Skip, 4),
                Op::new(Kind::Match, 2),
            ],
        )
        .sequence(b"GTAC")
        .quality_scores(&[11, 12, 13, 14])
        .build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}

#[test]
fn test_paired_records_round_trip() -> io::Result<()> {
    let first = RecordBuilder::mapped("p0", 0, 1, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .quality_scores(&[30; 5])
        .flags(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::FIRST_OF_PAIR)
        .mate(Some(0), Some(21), 25)
        .build();

    let last = RecordBuilder::mapped("p0", 0, 21, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .quality_scores(&[30; 5])
        .flags(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::LAST_OF_PAIR)
        .mate(Some(0), Some(1), -25)
        .build();

    assert_round_trip(&header(), &repository(), &[first, last], |builder| builder)
}

#[test]
fn test_paired_records_with_nonstandard_template_length_round_trip() -> io::Result<()> {
    let first = RecordBuilder::mapped("p0", 0, 1, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .flags(Flags::PAIRED | Flags::FIRST_OF_PAIR)
        .mate(Some(0), Some(21), 42)
        .build();

    let last = RecordBuilder::mapped("p0", 0, 21, &[Op::new(Kind::Match, 5)])
        .sequence(b"ACGTA")
        .flags(Flags::PAIRED | Flags::LAST_OF_PAIR)
        .mate(Some(0), Some(1), -42)
        .build();

    assert_round_trip(&header(), &repository(), &[first, last], |builder| builder)
}

#[test]
fn test_multi_reference_container_round_trip() -> io::Result<()> {
    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 4)])
            .sequence(b"ACGT")
            .build(),
        RecordBuilder::mapped("r1", 1, 5, &[Op::new(Kind::Match, 4)])
            .sequence(b"GGGC")
            .build(),
        RecordBuilder::unmapped("r2", b"ACGT").build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}

#[test]
fn test_reference_less_round_trip() -> io::Result<()> {
    use ramune_cram::reference::Repository;

    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 8)])
            .sequence(b"ACGTACGT")
            .quality_scores(&[40; 8])
            .build(),
        RecordBuilder::mapped("r1", 0, 3, &[Op::new(Kind::Match, 4)])
            .sequence(b"NRYK")
            .build(),
    ];

    // An empty repository switches the writer to reference-less encoding;
    // decoding must not need the reference either.
    let empty = Repository::default();

    assert_round_trip(&header(), &empty, &records, |builder| builder)
}

#[test]
fn test_aux_data_round_trip() -> io::Result<()> {
    let records = vec![
        RecordBuilder::unmapped("r0", b"ACGT")
            .data(b"NHC\x01RGZrg0\x00")
            .build(),
        RecordBuilder::unmapped("r1", b"ACGT")
            .data(b"XBBc\x02\x00\x00\x00\x01\x02")
            .build(),
        RecordBuilder::unmapped("r2", b"ACGT").build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}

#[test]
fn test_round_trip_across_versions() -> io::Result<()> {
    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 8)])
            .sequence(b"ACGTACGT")
            .quality_scores(&[40; 8])
            .build(),
        RecordBuilder::unmapped("r1", b"TTACA")
            .quality_scores(&[9, 8, 7, 6, 5])
            .build(),
    ];

    for version in [Version::V2_1, Version::V3_0, Version::V3_1] {
        assert_round_trip(&header(), &repository(), &records, |builder| {
            builder.set_version(version)
        })?;
    }

    Ok(())
}

#[test]
fn test_round_trip_with_alternate_compressors() -> io::Result<()> {
    let quality_scores: Vec<u8> = (0..60).map(|i| 30 + (i % 5)).collect();
    let sequence: Vec<u8> = b"ACGT".repeat(15);

    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 40), Op::new(Kind::SoftClip, 20)])
            .sequence(&sequence)
            .quality_scores(&quality_scores)
            .build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| {
        builder.set_use_bzip2(true).set_use_rans(true)
    })?;

    assert_round_trip(&header(), &repository(), &records, |builder| {
        builder.set_use_rans(false)
    })
}

#[test]
fn test_round_trip_with_name_tokenizer() -> io::Result<()> {
    let records: Vec<_> = (0..16)
        .map(|i| {
            RecordBuilder::unmapped(&format!("run.{i}"), b"ACGT")
                .quality_scores(&[30; 4])
                .build()
        })
        .collect();

    assert_round_trip(&header(), &repository(), &records, |builder| {
        builder
            .set_version(Version::V3_1)
            .set_use_name_tokenizer(true)
    })
}

#[test]
fn test_round_trip_with_multiple_slices() -> io::Result<()> {
    let records: Vec<_> = (0..10)
        .map(|i| {
            RecordBuilder::mapped(&format!("r{i}"), 0, i + 1, &[Op::new(Kind::Match, 4)])
                .sequence(b"NNNN")
                .quality_scores(&[30; 4])
                .build()
        })
        .collect();

    assert_round_trip(&header(), &repository(), &records, |builder| {
        builder.set_records_per_slice(3).set_slices_per_container(2)
    })
}

#[test]
fn test_round_trip_preserves_quality_less_records() -> io::Result<()> {
    let records = vec![
        RecordBuilder::mapped("r0", 0, 1, &[Op::new(Kind::Match, 4)])
            .sequence(b"ACGT")
            .build(),
        RecordBuilder::unmapped("r1", b"ACGT").build(),
    ];

    assert_round_trip(&header(), &repository(), &records, |builder| builder)
}
