//! BAM record to CRAM record conversion.

use std::{io, sync::Arc};

use bstr::BString;
use ramune_bam as bam;
use ramune_core::Position;
use ramune_sam::{self as sam, cigar::op::Kind};

use crate::{
    container::compression_header::preservation_map::{
        SubstitutionMatrix,
        substitution_matrix::Base,
        tag_sets::{TagDescriptor, TagSets},
    },
    record::{Feature, Flags, MateFlags},
};

/// A record staged for slice encoding.
pub(super) struct WriteRecord {
    pub(super) bam_flags: sam::Flags,
    pub(super) cram_flags: Flags,
    pub(super) reference_sequence_id: Option<usize>,
    pub(super) read_length: usize,
    pub(super) alignment_start: Option<Position>,
    pub(super) alignment_end: Option<Position>,
    pub(super) name: BString,
    pub(super) mate_flags: MateFlags,
    pub(super) mate_reference_sequence_id: Option<usize>,
    pub(super) mate_alignment_start: Option<Position>,
    pub(super) template_length: i32,
    pub(super) explicit_template_length: Option<i32>,
    pub(super) mate_distance: Option<usize>,
    pub(super) mapping_quality: u8,
    pub(super) tag_set_id: usize,
    pub(super) tags: Vec<(TagDescriptor, Vec<u8>)>,
    pub(super) features: Vec<Feature>,
    pub(super) sequence: Vec<u8>,
    pub(super) quality_scores: Vec<u8>,
}

impl WriteRecord {
    pub(super) fn is_mapped(&self) -> bool {
        !self.bam_flags.is_unmapped() && self.alignment_start.is_some()
    }
}

/// Converts a BAM record for CRAM encoding.
///
/// `reference` is the full reference sequence the record maps to, or `None`
/// in reference-less mode, where match stretches are stored verbatim.
pub(super) fn convert_record(
    record: &bam::Record,
    reference: Option<&Arc<[u8]>>,
    substitution_matrix: &SubstitutionMatrix,
    tag_sets: &mut TagSets,
) -> io::Result<WriteRecord> {
    let tags = parse_data(record.data())?;

    let descriptors: Vec<_> = tags.iter().map(|(descriptor, _)| *descriptor).collect();
    let tag_set_id = match tag_sets.position(&descriptors) {
        Some(id) => id,
        None => {
            tag_sets.push(descriptors);
            tag_sets.len() - 1
        }
    };

    let mut cram_flags = Flags::empty();

    if !record.quality_scores().is_empty() {
        cram_flags |= Flags::QUALITY_SCORES;
    }

    let mut mate_flags = MateFlags::empty();

    if record.flags().is_mate_reverse_complemented() {
        mate_flags |= MateFlags::ON_NEGATIVE_STRAND;
    }

    if record.flags().is_mate_unmapped() {
        mate_flags |= MateFlags::UNMAPPED;
    }

    // The last consumed reference base; one before the start for
    // alignments that consume no reference, matching the decoder.
    let alignment_end = record.alignment_start().and_then(|start| {
        let span = ramune_sam::cigar::alignment_span(record.cigar());
        Position::new(usize::from(start) + span).and_then(|end| end.checked_sub(1))
    });

    let mut converted = WriteRecord {
        bam_flags: record.flags(),
        cram_flags,
        reference_sequence_id: record.reference_sequence_id(),
        read_length: record.sequence().len(),
        alignment_start: record.alignment_start(),
        alignment_end,
        name: record
            .name()
            .map(BString::from)
            .unwrap_or_else(|| BString::from("*")),
        mate_flags,
        mate_reference_sequence_id: record.mate_reference_sequence_id(),
        mate_alignment_start: record.mate_alignment_start(),
        template_length: record.template_length(),
        explicit_template_length: None,
        mate_distance: None,
        mapping_quality: record.mapping_quality(),
        tag_set_id,
        tags,
        features: Vec::new(),
        sequence: record.sequence().to_vec(),
        quality_scores: record.quality_scores().to_vec(),
    };

    if converted.is_mapped() {
        converted.features =
            build_features(record, reference, substitution_matrix)?;
    }

    Ok(converted)
}

/// Builds the feature list of a mapped record by diffing its sequence
/// against the reference along the CIGAR.
fn build_features(
    record: &bam::Record,
    reference: Option<&Arc<[u8]>>,
    substitution_matrix: &SubstitutionMatrix,
) -> io::Result<Vec<Feature>> {
    let sequence = record.sequence();

    let mut features = Vec::new();

    // 1-based positions.
    let mut read_pos = 1;
    let mut ref_pos = record
        .alignment_start()
        .map(usize::from)
        .unwrap_or(1);

    let position = |read_pos: usize| {
        Position::new(read_pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid read position")
        })
    };

    for op in record.cigar() {
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                let bases = sequence
                    .get(read_pos - 1..read_pos - 1 + op.len())
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "CIGAR is longer than the sequence",
                        )
                    })?;

                match reference {
                    Some(reference) => {
                        emit_match_features(
                            &mut features,
                            bases,
                            read_pos,
                            ref_pos,
                            reference,
                            substitution_matrix,
                        )?;
                    }
                    None => {
                        features.push(Feature::Bases {
                            position: position(read_pos)?,
                            bases: bases.to_vec(),
                        });
                    }
                }

                read_pos += op.len();
                ref_pos += op.len();
            }
            Kind::Insertion => {
                let bases = sequence
                    .get(read_pos - 1..read_pos - 1 + op.len())
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "CIGAR is longer than the sequence",
                        )
                    })?;

                if let [base] = bases {
                    features.push(Feature::InsertBase {
                        position: position(read_pos)?,
                        base: *base,
                    });
                } else {
                    features.push(Feature::Insertion {
                        position: position(read_pos)?,
                        bases: bases.to_vec(),
                    });
                }

                read_pos += op.len();
            }
            Kind::Deletion => {
                features.push(Feature::Deletion {
                    position: position(read_pos)?,
                    len: op.len(),
                });

                ref_pos += op.len();
            }
            Kind::Skip => {
                features.push(Feature::ReferenceSkip {
                    position: position(read_pos)?,
                    len: op.len(),
                });

                ref_pos += op.len();
            }
            Kind::SoftClip => {
                let bases = sequence
                    .get(read_pos - 1..read_pos - 1 + op.len())
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "CIGAR is longer than the sequence",
                        )
                    })?;

                features.push(Feature::SoftClip {
                    position: position(read_pos)?,
                    bases: bases.to_vec(),
                });

                read_pos += op.len();
            }
            Kind::HardClip => {
                features.push(Feature::HardClip {
                    position: position(read_pos)?,
                    len: op.len(),
                });
            }
            Kind::Pad => {
                features.push(Feature::Padding {
                    position: position(read_pos)?,
                    len: op.len(),
                });
            }
        }
    }

    Ok(features)
}

/// Emits substitution features for resolvable mismatches within a match
/// stretch; anything else (ambiguity codes, bases past the reference end)
/// is stored verbatim as a bases stretch.
fn emit_match_features(
    features: &mut Vec<Feature>,
    bases: &[u8],
    read_pos: usize,
    ref_pos: usize,
    reference: &Arc<[u8]>,
    substitution_matrix: &SubstitutionMatrix,
) -> io::Result<()> {
    enum BaseKind {
        Match,
        Substitution(u8),
        Verbatim,
    }

    let mut verbatim_start: Option<usize> = None;

    for (i, &read_base) in bases.iter().enumerate() {
        let reference_base = reference.get(ref_pos + i - 1).copied();

        let kind = match reference_base {
            // An exact match: the decoder copies the reference byte.
            Some(reference_base) if reference_base == read_base => BaseKind::Match,
            Some(reference_base) => {
                // Substitutions only cover the resolvable alphabet.
                match (Base::try_from(reference_base), Base::try_from(read_base)) {
                    (Ok(r), Ok(b)) if r != b => {
                        BaseKind::Substitution(substitution_matrix.find(r, b))
                    }
                    _ => BaseKind::Verbatim,
                }
            }
            None => BaseKind::Verbatim,
        };

        match kind {
            BaseKind::Verbatim => {
                verbatim_start.get_or_insert(i);
            }
            BaseKind::Match => {
                flush_verbatim(features, bases, &mut verbatim_start, read_pos, i)?;
            }
            BaseKind::Substitution(code) => {
                flush_verbatim(features, bases, &mut verbatim_start, read_pos, i)?;

                features.push(Feature::Substitution {
                    position: Position::new(read_pos + i).ok_or_else(invalid_position)?,
                    code,
                });
            }
        }
    }

    flush_verbatim(features, bases, &mut verbatim_start, read_pos, bases.len())?;

    Ok(())
}

fn flush_verbatim(
    features: &mut Vec<Feature>,
    bases: &[u8],
    verbatim_start: &mut Option<usize>,
    read_pos: usize,
    end: usize,
) -> io::Result<()> {
    if let Some(start) = verbatim_start.take() {
        features.push(Feature::Bases {
            position: Position::new(read_pos + start).ok_or_else(invalid_position)?,
            bases: bases[start..end].to_vec(),
        });
    }

    Ok(())
}

fn invalid_position() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "invalid read position")
}

/// Splits BAM auxiliary data into (descriptor, value) entries.
pub(super) fn parse_data(mut src: &[u8]) -> io::Result<Vec<(TagDescriptor, Vec<u8>)>> {
    let mut tags = Vec::new();

    while !src.is_empty() {
        let ([tag0, tag1, ty], rest) = split_first_n(src)?;
        src = rest;

        let len = match ty {
            b'A' | b'c' | b'C' => 1,
            b's' | b'S' => 2,
            b'i' | b'I' | b'f' => 4,
            b'Z' | b'H' => {
                memchr::memchr(0x00, src)
                    .map(|i| i + 1)
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "unterminated tag value")
                    })?
            }
            b'B' => {
                let ([subtype, n0, n1, n2, n3], _) = split_first_n(src)?;

                let n = u32::from_le_bytes([n0, n1, n2, n3]) as usize;

                let element_size = match subtype {
                    b'c' | b'C' => 1,
                    b's' | b'S' => 2,
                    b'i' | b'I' | b'f' => 4,
                    _ => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "invalid array tag subtype",
                        ));
                    }
                };

                5 + n * element_size
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid tag value type: {}", ty as char),
                ));
            }
        };

        let value = src
            .get(..len)
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        tags.push((
            TagDescriptor {
                tag: [tag0, tag1],
                ty,
            },
            value.to_vec(),
        ));

        src = &src[len..];
    }

    Ok(tags)
}

fn split_first_n<const N: usize>(src: &[u8]) -> io::Result<([u8; N], &[u8])> {
    src.split_first_chunk()
        .map(|(chunk, rest)| (*chunk, rest))
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data() -> io::Result<()> {
        let src = [
            b'N', b'H', b'C', 0x01, // NH:C:1
            b'M', b'D', b'Z', b'4', 0x00, // MD:Z:4
            b'X', b'B', b'B', b'c', 0x02, 0x00, 0x00, 0x00, 0x01, 0x02, // XB:B:c,1,2
        ];

        let tags = parse_data(&src)?;

        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].0.tag, *b"NH");
        assert_eq!(tags[0].0.ty, b'C');
        assert_eq!(tags[0].1, [0x01]);
        assert_eq!(tags[1].1, b"4\x00");
        assert_eq!(tags[2].1.len(), 7);

        Ok(())
    }

    #[test]
    fn test_parse_data_with_unterminated_string() {
        let src = [b'M', b'D', b'Z', b'4'];
        assert!(parse_data(&src).is_err());
    }
}
