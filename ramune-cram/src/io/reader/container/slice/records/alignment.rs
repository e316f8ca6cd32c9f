//! Sequence and CIGAR reconstruction from read features.

use std::{fmt::Write, io};

use ramune_core::Position;
use ramune_sam::cigar::{Op, op::Kind};

use super::ReferenceBases;
use crate::{
    container::compression_header::preservation_map::{
        SubstitutionMatrix, substitution_matrix::Base,
    },
    record::Feature,
};

pub(super) struct Alignment {
    pub(super) sequence: Vec<u8>,
    pub(super) cigar: Vec<Op>,
    pub(super) alignment_end: Option<Position>,
    pub(super) md: Option<String>,
    pub(super) nm: Option<i32>,
}

/// Rebuilds the sequence and CIGAR of a mapped record from its features and
/// the reference, walking read and reference positions in lockstep.
///
/// Bases between features and after the last feature come from the
/// reference, or `N` past its end. Quality-bearing features write into
/// `quality_scores`. When `generate_md_nm` is set and the reference covers
/// the alignment, the MD string and NM distance are computed as a side
/// effect.
#[allow(clippy::too_many_arguments)]
pub(super) fn reconstruct(
    features: &[Feature],
    read_length: usize,
    alignment_start: Position,
    reference: Option<&ReferenceBases>,
    substitution_matrix: &SubstitutionMatrix,
    quality_scores: &mut [u8],
    build_sequence: bool,
    generate_md_nm: bool,
) -> io::Result<Alignment> {
    let mut builder = Builder {
        reference,
        sequence: Vec::with_capacity(if build_sequence { read_length } else { 0 }),
        cigar: Vec::new(),
        pending_op: None,
        ref_pos: usize::from(alignment_start),
        read_pos: 1,
        read_length,
        build_sequence,
        md: if generate_md_nm && reference.is_some() {
            Some(MdNm::default())
        } else {
            None
        },
        quality_baseline_set: false,
    };

    for feature in features {
        let position = usize::from(feature.position());

        if position > read_length + 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("feature position {position} past the end of the read"),
            ));
        }

        builder.fill_matches_to(position);

        match feature {
            Feature::Bases { bases, .. } => {
                builder.push_bases(bases);
                builder.push_op(Kind::Match, bases.len());
                builder.compare_to_reference(bases);
                builder.ref_pos += bases.len();
                builder.read_pos += bases.len();
            }
            Feature::Scores { quality_scores: scores, .. } => {
                write_quality_scores(
                    quality_scores,
                    position,
                    scores,
                    &mut builder.quality_baseline_set,
                )?;
            }
            Feature::ReadBase {
                base,
                quality_score,
                ..
            } => {
                builder.push_bases(&[*base]);
                builder.push_op(Kind::Match, 1);
                builder.compare_to_reference(&[*base]);
                write_quality_scores(
                    quality_scores,
                    position,
                    &[*quality_score],
                    &mut builder.quality_baseline_set,
                )?;
                builder.ref_pos += 1;
                builder.read_pos += 1;
            }
            Feature::Substitution { code, .. } => {
                let reference_base = builder
                    .reference_base(builder.ref_pos)
                    .and_then(|b| Base::try_from(b).ok())
                    .unwrap_or(Base::N);

                let read_base = substitution_matrix.get(reference_base, *code);
                builder.push_bases(&[u8::from(read_base)]);
                builder.push_op(Kind::Match, 1);
                builder.record_mismatch();
                builder.ref_pos += 1;
                builder.read_pos += 1;
            }
            Feature::Insertion { bases, .. } => {
                builder.push_bases(bases);
                builder.push_op(Kind::Insertion, bases.len());
                builder.record_insertion(bases.len());
                builder.read_pos += bases.len();
            }
            Feature::InsertBase { base, .. } => {
                builder.push_bases(&[*base]);
                builder.push_op(Kind::Insertion, 1);
                builder.record_insertion(1);
                builder.read_pos += 1;
            }
            Feature::Deletion { len, .. } => {
                builder.push_op(Kind::Deletion, *len);
                builder.record_deletion(*len);
                builder.ref_pos += len;
            }
            Feature::QualityScore { quality_score, .. } => {
                write_quality_scores(
                    quality_scores,
                    position,
                    &[*quality_score],
                    &mut builder.quality_baseline_set,
                )?;
            }
            Feature::ReferenceSkip { len, .. } => {
                builder.push_op(Kind::Skip, *len);
                builder.ref_pos += len;
            }
            Feature::SoftClip { bases, .. } => {
                builder.push_bases(bases);
                builder.push_op(Kind::SoftClip, bases.len());
                builder.read_pos += bases.len();
            }
            Feature::Padding { len, .. } => {
                builder.push_op(Kind::Pad, *len);
            }
            Feature::HardClip { len, .. } => {
                builder.push_op(Kind::HardClip, *len);
            }
        }
    }

    builder.fill_matches_to(read_length + 1);
    builder.finish()
}

struct Builder<'a> {
    reference: Option<&'a ReferenceBases>,
    sequence: Vec<u8>,
    cigar: Vec<Op>,
    pending_op: Option<(Kind, usize)>,
    // 1-based reference position of the next consumed reference base.
    ref_pos: usize,
    // 1-based read position of the next unwritten read base.
    read_pos: usize,
    read_length: usize,
    build_sequence: bool,
    md: Option<MdNm>,
    quality_baseline_set: bool,
}

#[derive(Default)]
struct MdNm {
    md: String,
    // Matching bases since the last MD entry; `None` marks the MD string as
    // invalidated by a too-short reference.
    match_count: Option<usize>,
    nm: i32,
}

impl Builder<'_> {
    fn reference_base(&self, position: usize) -> Option<u8> {
        self.reference.and_then(|bases| bases.get(position))
    }

    /// Emits reference-copied matches up to (not including) read position
    /// `position`.
    fn fill_matches_to(&mut self, position: usize) {
        if position <= self.read_pos {
            return;
        }

        let len = position - self.read_pos;
        let mut past_reference_end = false;

        for i in 0..len {
            let base = match self.reference_base(self.ref_pos + i) {
                Some(base) => base,
                None => {
                    past_reference_end = true;
                    b'N'
                }
            };

            if self.build_sequence {
                self.sequence.push(base);
            }
        }

        self.push_op(Kind::Match, len);

        if let Some(md_nm) = &mut self.md {
            if past_reference_end {
                md_nm.match_count = None;
            } else if let Some(count) = &mut md_nm.match_count {
                *count += len;
            }
        }

        self.ref_pos += len;
        self.read_pos = position;
    }

    fn push_bases(&mut self, bases: &[u8]) {
        if self.build_sequence {
            self.sequence.extend_from_slice(bases);
        }
    }

    /// Appends a CIGAR operation, merging adjacent same-kind entries.
    fn push_op(&mut self, kind: Kind, len: usize) {
        if len == 0 {
            return;
        }

        match &mut self.pending_op {
            Some((pending_kind, pending_len)) if *pending_kind == kind => {
                *pending_len += len;
            }
            pending => {
                if let Some((pending_kind, pending_len)) = pending.take() {
                    self.cigar.push(Op::new(pending_kind, pending_len));
                }

                *pending = Some((kind, len));
            }
        }
    }

    /// Compares read bases against the reference for MD/NM accounting.
    fn compare_to_reference(&mut self, bases: &[u8]) {
        let ref_pos = self.ref_pos;

        let Some(md_nm) = &mut self.md else {
            return;
        };

        for (i, &read_base) in bases.iter().enumerate() {
            let Some(reference_base) =
                self.reference.and_then(|r| r.get(ref_pos + i))
            else {
                md_nm.match_count = None;
                return;
            };

            if read_base.eq_ignore_ascii_case(&reference_base) {
                if let Some(count) = &mut md_nm.match_count {
                    *count += 1;
                }
            } else {
                md_nm.nm += 1;

                if let Some(count) = md_nm.match_count.take() {
                    let _ = write!(md_nm.md, "{count}");
                    md_nm.md.push(reference_base.to_ascii_uppercase() as char);
                    md_nm.match_count = Some(0);
                }
            }
        }
    }

    /// Records a substitution at the current reference position.
    fn record_mismatch(&mut self) {
        let reference_base = self.reference_base(self.ref_pos);

        let Some(md_nm) = &mut self.md else {
            return;
        };

        md_nm.nm += 1;

        let Some(reference_base) = reference_base else {
            md_nm.match_count = None;
            return;
        };

        if let Some(count) = md_nm.match_count.take() {
            let _ = write!(md_nm.md, "{count}");
            md_nm.md.push(reference_base.to_ascii_uppercase() as char);
            md_nm.match_count = Some(0);
        }
    }

    fn record_insertion(&mut self, len: usize) {
        if let Some(md_nm) = &mut self.md {
            md_nm.nm += len as i32;
        }
    }

    fn record_deletion(&mut self, len: usize) {
        let ref_pos = self.ref_pos;

        let Some(md_nm) = &mut self.md else {
            return;
        };

        md_nm.nm += len as i32;

        let Some(count) = md_nm.match_count.take() else {
            return;
        };

        let _ = write!(md_nm.md, "{count}");
        md_nm.md.push('^');

        for i in 0..len {
            let Some(reference_base) = self.reference.and_then(|r| r.get(ref_pos + i)) else {
                md_nm.match_count = None;
                return;
            };

            md_nm.md.push(reference_base.to_ascii_uppercase() as char);
        }

        md_nm.match_count = Some(0);
    }

    fn finish(mut self) -> io::Result<Alignment> {
        if self.build_sequence && self.sequence.len() != self.read_length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "reconstructed sequence length mismatch: expected {}, got {}",
                    self.read_length,
                    self.sequence.len()
                ),
            ));
        }

        if let Some((kind, len)) = self.pending_op.take() {
            self.cigar.push(Op::new(kind, len));
        }

        // The alignment end is the last consumed reference base.
        let alignment_end = Position::new(self.ref_pos - 1);

        // A reference shorter than the alignment invalidates both values.
        let (md, nm) = match self.md {
            Some(mut md_nm) => match md_nm.match_count.take() {
                Some(count) => {
                    let _ = write!(md_nm.md, "{count}");
                    (Some(md_nm.md), Some(md_nm.nm))
                }
                None => (None, None),
            },
            None => (None, None),
        };

        Ok(Alignment {
            sequence: self.sequence,
            cigar: self.cigar,
            alignment_end,
            md,
            nm,
        })
    }
}

fn write_quality_scores(
    quality_scores: &mut [u8],
    position: usize,
    scores: &[u8],
    quality_baseline_set: &mut bool,
) -> io::Result<()> {
    // The first quality-bearing feature raises the default for the whole
    // read from "missing" to a nominal 30.
    if !*quality_baseline_set {
        if quality_scores.first() == Some(&255) {
            quality_scores.fill(30);
        }

        *quality_baseline_set = true;
    }

    let i = position - 1;

    let dst = quality_scores
        .get_mut(i..i + scores.len())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "quality scores past the end of the read",
            )
        })?;

    dst.copy_from_slice(scores);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn reference_bases(bases: &[u8]) -> ReferenceBases {
        ReferenceBases::new(Arc::from(bases), 1)
    }

    fn t(
        features: &[Feature],
        read_length: usize,
        start: usize,
        reference: &ReferenceBases,
        generate_md_nm: bool,
    ) -> io::Result<(Alignment, Vec<u8>)> {
        let mut quality_scores = vec![255; read_length];

        let alignment = reconstruct(
            features,
            read_length,
            Position::try_from(start).unwrap(),
            Some(reference),
            &SubstitutionMatrix::default(),
            &mut quality_scores,
            true,
            generate_md_nm,
        )?;

        Ok((alignment, quality_scores))
    }

    #[test]
    fn test_reconstruct_full_match() -> io::Result<()> {
        let reference = reference_bases(b"ACGTACGT");

        let (alignment, _) = t(&[], 4, 3, &reference, true)?;

        assert_eq!(alignment.sequence, b"GTAC");
        assert_eq!(alignment.cigar, [Op::new(Kind::Match, 4)]);
        assert_eq!(alignment.alignment_end, Position::new(6));
        assert_eq!(alignment.md.as_deref(), Some("4"));
        assert_eq!(alignment.nm, Some(0));

        Ok(())
    }

    #[test]
    fn test_reconstruct_with_substitution() -> io::Result<()> {
        let reference = reference_bases(b"AAAAA");

        // Reference base A with substitution code 0 resolves to C.
        let features = [Feature::Substitution {
            position: Position::try_from(2).unwrap(),
            code: 0,
        }];

        let (alignment, _) = t(&features, 4, 1, &reference, true)?;

        assert_eq!(alignment.sequence, b"ACAA");
        assert_eq!(alignment.cigar, [Op::new(Kind::Match, 4)]);
        assert_eq!(alignment.md.as_deref(), Some("1A2"));
        assert_eq!(alignment.nm, Some(1));

        Ok(())
    }

    #[test]
    fn test_reconstruct_with_insertion_and_deletion() -> io::Result<()> {
        let reference = reference_bases(b"ACGTACGT");

        let features = [
            Feature::Insertion {
                position: Position::try_from(3).unwrap(),
                bases: b"TT".to_vec(),
            },
            Feature::Deletion {
                position: Position::try_from(5).unwrap(),
                len: 2,
            },
        ];

        let (alignment, _) = t(&features, 6, 1, &reference, true)?;

        assert_eq!(alignment.sequence, b"ACTTAC");
        assert_eq!(
            alignment.cigar,
            [
                Op::new(Kind::Match, 2),
                Op::new(Kind::Insertion, 2),
                Op::new(Kind::Deletion, 2),
                Op::new(Kind::Match, 2),
            ]
        );
        // 2M 2I 2D 2M consumes 6 reference bases.
        assert_eq!(alignment.alignment_end, Position::new(6));
        assert_eq!(alignment.md.as_deref(), Some("2^GT2"));
        assert_eq!(alignment.nm, Some(4));

        Ok(())
    }

    #[test]
    fn test_reconstruct_with_soft_clip() -> io::Result<()> {
        let reference = reference_bases(b"ACGT");

        let features = [Feature::SoftClip {
            position: Position::try_from(1).unwrap(),
            bases: b"NN".to_vec(),
        }];

        let (alignment, _) = t(&features, 5, 1, &reference, true)?;

        assert_eq!(alignment.sequence, b"NNACG");
        assert_eq!(
            alignment.cigar,
            [Op::new(Kind::SoftClip, 2), Op::new(Kind::Match, 3)]
        );
        assert_eq!(alignment.md.as_deref(), Some("3"));

        Ok(())
    }

    #[test]
    fn test_reconstruct_past_reference_end() -> io::Result<()> {
        let reference = reference_bases(b"AC");

        let (alignment, _) = t(&[], 4, 1, &reference, true)?;

        assert_eq!(alignment.sequence, b"ACNN");
        // The MD string cannot be computed for bases past the reference.
        assert_eq!(alignment.md, None);
        assert_eq!(alignment.nm, None);

        Ok(())
    }

    #[test]
    fn test_reconstruct_with_quality_features() -> io::Result<()> {
        let reference = reference_bases(b"ACGT");

        let features = [Feature::QualityScore {
            position: Position::try_from(2).unwrap(),
            quality_score: 40,
        }];

        let (_, quality_scores) = t(&features, 4, 1, &reference, false)?;

        // A quality feature raises the baseline for the whole read.
        assert_eq!(quality_scores, [30, 40, 30, 30]);

        Ok(())
    }
}
