//! BAM record block codec.
//!
//! The record block is a fixed-size little-endian prefix followed by the
//! variable-length name, CIGAR, sequence, quality score, and auxiliary data
//! fields. All multi-byte integers are packed and unpacked byte-wise; no
//! in-memory struct layout is reinterpreted.

mod sequence;

use std::{io, mem};

use bstr::BString;
use ramune_core::Position;
use ramune_sam::{
    Flags,
    cigar::{
        Op,
        op::Kind,
    },
};

use crate::record::{MISSING_MAPPING_QUALITY, Record};

const NUL: u8 = 0x00;
const MISSING_NAME: &[u8] = b"*";
const MISSING_QUALITY_SCORE: u8 = 0xff;

// Fixed-size prefix: ref_id, pos, l_read_name + mapq + bin, n_cigar_op +
// flag, l_seq, next_ref_id, next_pos, tlen.
const PREFIX_LEN: usize = 8 * mem::size_of::<u32>();

/// Encodes a record into a BAM record block.
pub fn encode(dst: &mut Vec<u8>, record: &Record) -> io::Result<()> {
    let reference_sequence_id = encode_reference_sequence_id(record.reference_sequence_id)?;
    dst.extend_from_slice(&reference_sequence_id.to_le_bytes());

    let alignment_start = encode_alignment_start(record.alignment_start)?;
    dst.extend_from_slice(&alignment_start.to_le_bytes());

    let name = record.name.as_ref().map_or(MISSING_NAME, |name| name.as_slice());
    let l_read_name = u8::try_from(name.len() + 1)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    dst.push(l_read_name);

    dst.push(record.mapping_quality);

    let bin = region_to_bin(record.alignment_start, record.alignment_end());
    dst.extend_from_slice(&bin.to_le_bytes());

    let n_cigar_op = u16::try_from(record.cigar.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    dst.extend_from_slice(&n_cigar_op.to_le_bytes());

    dst.extend_from_slice(&u16::from(record.flags).to_le_bytes());

    let l_seq = u32::try_from(record.sequence.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    dst.extend_from_slice(&l_seq.to_le_bytes());

    let mate_reference_sequence_id =
        encode_reference_sequence_id(record.mate_reference_sequence_id)?;
    dst.extend_from_slice(&mate_reference_sequence_id.to_le_bytes());

    let mate_alignment_start = encode_alignment_start(record.mate_alignment_start)?;
    dst.extend_from_slice(&mate_alignment_start.to_le_bytes());

    dst.extend_from_slice(&record.template_length.to_le_bytes());

    dst.extend_from_slice(name);
    dst.push(NUL);

    for op in &record.cigar {
        dst.extend_from_slice(&encode_cigar_op(op)?.to_le_bytes());
    }

    sequence::pack(dst, &record.sequence);

    if record.quality_scores.is_empty() {
        dst.resize(dst.len() + record.sequence.len(), MISSING_QUALITY_SCORE);
    } else if record.quality_scores.len() == record.sequence.len() {
        dst.extend_from_slice(&record.quality_scores);
    } else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "sequence and quality score length mismatch",
        ));
    }

    dst.extend_from_slice(&record.data);

    Ok(())
}

/// Decodes a BAM record block into a record.
pub fn decode(mut src: &[u8]) -> io::Result<Record> {
    if src.len() < PREFIX_LEN {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }

    let reference_sequence_id = decode_reference_sequence_id(read_i32_le(&mut src)?)?;
    let alignment_start = decode_alignment_start(read_i32_le(&mut src)?)?;

    let l_read_name = usize::from(read_u8(&mut src)?);
    let mapping_quality = read_u8(&mut src)?;
    let _bin = read_u16_le(&mut src)?;

    let n_cigar_op = usize::from(read_u16_le(&mut src)?);
    let flags = Flags::from(read_u16_le(&mut src)?);

    let l_seq = usize::try_from(read_u32_le(&mut src)?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mate_reference_sequence_id = decode_reference_sequence_id(read_i32_le(&mut src)?)?;
    let mate_alignment_start = decode_alignment_start(read_i32_le(&mut src)?)?;
    let template_length = read_i32_le(&mut src)?;

    let name = decode_name(&mut src, l_read_name)?;

    let mut cigar = Vec::with_capacity(n_cigar_op);
    for _ in 0..n_cigar_op {
        cigar.push(decode_cigar_op(read_u32_le(&mut src)?)?);
    }

    let packed_seq_len = l_seq.div_ceil(2);
    let Some((packed, rest)) = src.split_at_checked(packed_seq_len) else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };
    let sequence = sequence::unpack(packed, l_seq);
    src = rest;

    let Some((qual, rest)) = src.split_at_checked(l_seq) else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };
    let quality_scores = if qual.iter().all(|&b| b == MISSING_QUALITY_SCORE) {
        Vec::new()
    } else {
        qual.to_vec()
    };
    src = rest;

    Ok(Record {
        name,
        flags,
        reference_sequence_id,
        alignment_start,
        mapping_quality,
        cigar,
        mate_reference_sequence_id,
        mate_alignment_start,
        template_length,
        sequence,
        quality_scores,
        data: src.to_vec(),
    })
}

fn encode_reference_sequence_id(id: Option<usize>) -> io::Result<i32> {
    match id {
        Some(n) => i32::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e)),
        None => Ok(-1),
    }
}

fn decode_reference_sequence_id(n: i32) -> io::Result<Option<usize>> {
    match n {
        -1 => Ok(None),
        _ => usize::try_from(n)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
    }
}

fn encode_alignment_start(position: Option<Position>) -> io::Result<i32> {
    // BAM stores 0-based positions; -1 means unplaced.
    match position {
        Some(position) => i32::try_from(usize::from(position) - 1)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e)),
        None => Ok(-1),
    }
}

fn decode_alignment_start(n: i32) -> io::Result<Option<Position>> {
    match n {
        -1 => Ok(None),
        _ => usize::try_from(n)
            .map(|m| Position::new(m + 1))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
    }
}

fn decode_name(src: &mut &[u8], l_read_name: usize) -> io::Result<Option<BString>> {
    let Some((buf, rest)) = src.split_at_checked(l_read_name) else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };

    *src = rest;

    // The name may be padded with extra NULs to a 4-byte boundary.
    let end = buf
        .iter()
        .position(|&b| b == NUL)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing NUL terminator"))?;

    match &buf[..end] {
        MISSING_NAME => Ok(None),
        name => Ok(Some(BString::from(name))),
    }
}

fn encode_cigar_op(op: &Op) -> io::Result<u32> {
    const MAX_LEN: usize = (1 << 28) - 1;

    if op.len() > MAX_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CIGAR operation length overflow",
        ));
    }

    let kind = match op.kind() {
        Kind::Match => 0,
        Kind::Insertion => 1,
        Kind::Deletion => 2,
        Kind::Skip => 3,
        Kind::SoftClip => 4,
        Kind::HardClip => 5,
        Kind::Pad => 6,
        Kind::SequenceMatch => 7,
        Kind::SequenceMismatch => 8,
    };

    Ok(((op.len() as u32) << 4) | kind)
}

fn decode_cigar_op(n: u32) -> io::Result<Op> {
    let kind = match n & 0x0f {
        0 => Kind::Match,
        1 => Kind::Insertion,
        2 => Kind::Deletion,
        3 => Kind::Skip,
        4 => Kind::SoftClip,
        5 => Kind::HardClip,
        6 => Kind::Pad,
        7 => Kind::SequenceMatch,
        8 => Kind::SequenceMismatch,
        m => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid CIGAR operation: {m}"),
            ));
        }
    };

    Ok(Op::new(kind, (n >> 4) as usize))
}

// § 5.3 "C source code for computing bin number and overlapping bins" (SAM
// specification).
fn region_to_bin(alignment_start: Option<Position>, alignment_end: Option<Position>) -> u16 {
    const UNPLACED_BIN: u16 = 4680;

    let (Some(start), Some(end)) = (alignment_start, alignment_end) else {
        return UNPLACED_BIN;
    };

    let beg = usize::from(start) - 1;
    let end = usize::from(end) - 1;

    let bin = if beg >> 14 == end >> 14 {
        ((1 << 15) - 1) / 7 + (beg >> 14)
    } else if beg >> 17 == end >> 17 {
        ((1 << 12) - 1) / 7 + (beg >> 17)
    } else if beg >> 20 == end >> 20 {
        ((1 << 9) - 1) / 7 + (beg >> 20)
    } else if beg >> 23 == end >> 23 {
        ((1 << 6) - 1) / 7 + (beg >> 23)
    } else if beg >> 26 == end >> 26 {
        ((1 << 3) - 1) / 7 + (beg >> 26)
    } else {
        0
    };

    bin as u16
}

fn read_u8(src: &mut &[u8]) -> io::Result<u8> {
    let Some((b, rest)) = src.split_first() else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };

    *src = rest;

    Ok(*b)
}

fn read_u16_le(src: &mut &[u8]) -> io::Result<u16> {
    let Some((buf, rest)) = src.split_first_chunk() else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };

    *src = rest;

    Ok(u16::from_le_bytes(*buf))
}

fn read_u32_le(src: &mut &[u8]) -> io::Result<u32> {
    let Some((buf, rest)) = src.split_first_chunk() else {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    };

    *src = rest;

    Ok(u32::from_le_bytes(*buf))
}

fn read_i32_le(src: &mut &[u8]) -> io::Result<i32> {
    read_u32_le(src).map(|n| n as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_record() -> Record {
        let mut record = Record::default();

        *record.name_mut() = Some(BString::from("r0"));
        *record.flags_mut() = Flags::empty();
        *record.reference_sequence_id_mut() = Some(1);
        *record.alignment_start_mut() = Position::new(9);
        *record.mapping_quality_mut() = 13;
        record.cigar_mut().push(Op::new(Kind::Match, 4));
        *record.mate_reference_sequence_id_mut() = None;
        *record.mate_alignment_start_mut() = None;
        *record.template_length_mut() = 0;
        record.sequence_mut().extend_from_slice(b"ACGT");
        record.quality_scores_mut().extend_from_slice(&[30, 30, 30, 30]);
        record
            .data_mut()
            .extend_from_slice(&[b'N', b'H', b'C', 0x01]);

        record
    }

    #[test]
    fn test_round_trip() -> io::Result<()> {
        let record = build_record();

        let mut buf = Vec::new();
        encode(&mut buf, &record)?;

        let actual = decode(&buf)?;
        assert_eq!(actual, record);

        Ok(())
    }

    #[test]
    fn test_encode() -> io::Result<()> {
        let record = build_record();

        let mut buf = Vec::new();
        encode(&mut buf, &record)?;

        let expected = [
            0x01, 0x00, 0x00, 0x00, // ref_id = 1
            0x08, 0x00, 0x00, 0x00, // pos = 8 (0-based)
            0x03, // l_read_name = 3
            0x0d, // mapq = 13
            0x49, 0x12, // bin = 4681
            0x01, 0x00, // n_cigar_op = 1
            0x00, 0x00, // flag = 0
            0x04, 0x00, 0x00, 0x00, // l_seq = 4
            0xff, 0xff, 0xff, 0xff, // next_ref_id = -1
            0xff, 0xff, 0xff, 0xff, // next_pos = -1
            0x00, 0x00, 0x00, 0x00, // tlen = 0
            b'r', b'0', 0x00, // read_name = "r0\x00"
            0x40, 0x00, 0x00, 0x00, // cigar = 4M
            0x12, 0x48, // seq = ACGT
            0x1e, 0x1e, 0x1e, 0x1e, // qual
            b'N', b'H', b'C', 0x01, // data = NH:C:1
        ];

        assert_eq!(buf, expected);

        Ok(())
    }

    #[test]
    fn test_decode_with_missing_fields() -> io::Result<()> {
        let record = Record::default();

        let mut buf = Vec::new();
        encode(&mut buf, &record)?;

        let actual = decode(&buf)?;
        assert_eq!(actual, record);

        Ok(())
    }

    #[test]
    fn test_decode_with_truncated_input() {
        let record = build_record();

        let mut buf = Vec::new();
        encode(&mut buf, &record).unwrap();

        // Aux data is the unframed tail, so only truncations into the fixed
        // fields are detectable.
        for len in [0, 8, PREFIX_LEN, PREFIX_LEN + 1] {
            assert!(matches!(
                decode(&buf[..len]),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof || e.kind() == io::ErrorKind::InvalidData,
            ));
        }
    }
}
