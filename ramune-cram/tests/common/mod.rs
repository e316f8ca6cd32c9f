use std::io;

use bstr::BString;
use ramune_bam as bam;
use ramune_core::Position;
use ramune_cram as cram;
use ramune_sam::{self as sam, cigar::Op};

use cram::reference::{Repository, Sequences};

/// A header with two reference sequences.
pub const HEADER_TEXT: &[u8] = b"@HD\tVN:1.6\n@SQ\tSN:sq0\tLN:40\n@SQ\tSN:sq1\tLN:20\n";

pub fn header() -> sam::Header {
    sam::Header::from_text(HEADER_TEXT).unwrap()
}

pub fn repository() -> Repository {
    let mut sequences = Sequences::default();
    sequences.insert("sq0", b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT".to_vec());
    sequences.insert("sq1", b"TTTTGGGGCCCCAAAATTTT".to_vec());
    Repository::new(sequences)
}

pub struct RecordBuilder(bam::Record);

impl RecordBuilder {
    pub fn unmapped(name: &str, sequence: &[u8]) -> Self {
        let mut record = bam::Record::default();

        *record.name_mut() = Some(BString::from(name));
        *record.flags_mut() = sam::Flags::UNMAPPED;
        *record.mapping_quality_mut() = 0;
        record.sequence_mut().extend_from_slice(sequence);

        Self(record)
    }

    pub fn mapped(name: &str, reference_sequence_id: usize, start: usize, cigar: &[Op]) -> Self {
        let mut record = bam::Record::default();

        *record.name_mut() = Some(BString::from(name));
        *record.flags_mut() = sam::Flags::empty();
        *record.reference_sequence_id_mut() = Some(reference_sequence_id);
        *record.alignment_start_mut() = Position::new(start);
        *record.mapping_quality_mut() = 60;
        record.cigar_mut().extend_from_slice(cigar);

        Self(record)
    }

    pub fn sequence(mut self, sequence: &[u8]) -> Self {
        self.0.sequence_mut().clear();
        self.0.sequence_mut().extend_from_slice(sequence);
        self
    }

    pub fn quality_scores(mut self, quality_scores: &[u8]) -> Self {
        self.0.quality_scores_mut().clear();
        self.0.quality_scores_mut().extend_from_slice(quality_scores);
        self
    }

    pub fn flags(mut self, flags: sam::Flags) -> Self {
        *self.0.flags_mut() = flags;
        self
    }

    pub fn mate(
        mut self,
        reference_sequence_id: Option<usize>,
        start: Option<usize>,
        template_length: i32,
    ) -> Self {
        *self.0.mate_reference_sequence_id_mut() = reference_sequence_id;
        *self.0.mate_alignment_start_mut() = start.and_then(Position::new);
        *self.0.template_length_mut() = template_length;
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.0.data_mut().extend_from_slice(data);
        self
    }

    pub fn build(self) -> bam::Record {
        self.0
    }
}

/// Writes records to an in-memory CRAM stream.
pub fn write_cram(
    header: &sam::Header,
    repository: &Repository,
    records: &[bam::Record],
    configure: impl FnOnce(cram::io::writer::Builder) -> cram::io::writer::Builder,
) -> io::Result<Vec<u8>> {
    let builder = cram::io::writer::Builder::default()
        .set_reference_sequence_repository(repository.clone());

    let mut writer = configure(builder).build_from_writer(Vec::new());

    writer.write_file_definition()?;
    writer.write_file_header(header)?;

    for record in records {
        writer.write_record(header, record.clone())?;
    }

    writer.try_finish(header)?;

    Ok(writer.into_inner())
}

/// Reads all records from an in-memory CRAM stream.
pub fn read_cram(
    src: &[u8],
    repository: &Repository,
    configure: impl FnOnce(cram::io::reader::Builder) -> cram::io::reader::Builder,
) -> io::Result<Vec<cram::Record>> {
    let builder = cram::io::reader::Builder::default()
        .set_reference_sequence_repository(repository.clone());

    let mut reader = configure(builder).build_from_reader(src);

    reader.read_file_definition()?;
    let header = reader.read_file_header()?;

    reader.records(&header).collect()
}

/// Encodes a BAM record block for byte-wise comparison.
pub fn encode_bam_record(record: &bam::Record) -> Vec<u8> {
    let mut buf = Vec::new();
    bam::codec::encode(&mut buf, record).unwrap();
    buf
}

/// Asserts a CRAM round trip reproduces the records byte-for-byte in their
/// BAM block representation.
pub fn assert_round_trip(
    header: &sam::Header,
    repository: &Repository,
    records: &[bam::Record],
    configure: impl FnOnce(cram::io::writer::Builder) -> cram::io::writer::Builder,
) -> io::Result<()> {
    let src = write_cram(header, repository, records, configure)?;
    let decoded = read_cram(&src, repository, |builder| builder)?;

    assert_eq!(decoded.len(), records.len());

    for (expected, actual) in records.iter().zip(decoded) {
        let actual = actual.into_bam_record();

        assert_eq!(
            encode_bam_record(expected),
            encode_bam_record(&actual),
            "round trip mismatch for {:?}",
            expected.name()
        );
    }

    Ok(())
}
