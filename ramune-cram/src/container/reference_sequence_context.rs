use std::io;

use ramune_core::Position;

/// The reference sequence a group of records is placed against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReferenceSequenceContext {
    /// All records map to one reference sequence over the given span.
    Some {
        /// The reference sequence id.
        reference_sequence_id: usize,
        /// The 1-based start of the alignment span.
        alignment_start: Position,
        /// The 1-based inclusive end of the alignment span.
        alignment_end: Position,
    },
    /// All records are unmapped and unplaced.
    #[default]
    None,
    /// Records map to more than one reference sequence (or a mix of mapped
    /// and unmapped).
    Many,
}

impl ReferenceSequenceContext {
    // § 9 "Container header structure" (2024-09-04): -2 is multi-reference,
    // -1 is unmapped-unplaced.
    const MANY: i32 = -2;
    const MISSING: i32 = -1;

    /// Creates a single-reference context.
    pub fn some(
        reference_sequence_id: usize,
        alignment_start: Position,
        alignment_end: Position,
    ) -> Self {
        Self::Some {
            reference_sequence_id,
            alignment_start,
            alignment_end,
        }
    }

    /// Returns whether this is a multi-reference context.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }

    /// Returns the alignment span in reference bases.
    pub fn alignment_span(&self) -> usize {
        match self {
            Self::Some {
                alignment_start,
                alignment_end,
                ..
            } => {
                // The end may be one before the start for alignments that
                // consume no reference.
                (usize::from(*alignment_end) + 1).saturating_sub(usize::from(*alignment_start))
            }
            _ => 0,
        }
    }

    pub(crate) fn raw_reference_sequence_id(&self) -> i32 {
        match self {
            Self::Some {
                reference_sequence_id,
                ..
            } => *reference_sequence_id as i32,
            Self::None => Self::MISSING,
            Self::Many => Self::MANY,
        }
    }

    pub(crate) fn raw_alignment_start(&self) -> i32 {
        match self {
            Self::Some {
                alignment_start, ..
            } => usize::from(*alignment_start) as i32,
            _ => 0,
        }
    }
}

impl TryFrom<(i32, i64, i64)> for ReferenceSequenceContext {
    type Error = io::Error;

    fn try_from(
        (reference_sequence_id, alignment_start, alignment_span): (i32, i64, i64),
    ) -> Result<Self, Self::Error> {
        match reference_sequence_id {
            Self::MANY => Ok(Self::Many),
            Self::MISSING => Ok(Self::None),
            id => {
                let reference_sequence_id = usize::try_from(id)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                let start = usize::try_from(alignment_start)
                    .ok()
                    .and_then(Position::new)
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid alignment start")
                    })?;

                let span = usize::try_from(alignment_span)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                let end = start
                    .checked_add(span.saturating_sub(1))
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid alignment span")
                    })?;

                Ok(Self::some(reference_sequence_id, start, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from() -> io::Result<()> {
        assert_eq!(
            ReferenceSequenceContext::try_from((-2, 0, 0))?,
            ReferenceSequenceContext::Many
        );
        assert_eq!(
            ReferenceSequenceContext::try_from((-1, 0, 0))?,
            ReferenceSequenceContext::None
        );

        let actual = ReferenceSequenceContext::try_from((2, 3, 5))?;
        let expected = ReferenceSequenceContext::some(
            2,
            Position::try_from(3).unwrap(),
            Position::try_from(7).unwrap(),
        );
        assert_eq!(actual, expected);

        assert!(ReferenceSequenceContext::try_from((0, 0, 5)).is_err());

        Ok(())
    }

    #[test]
    fn test_alignment_span() {
        let context = ReferenceSequenceContext::some(
            0,
            Position::try_from(8).unwrap(),
            Position::try_from(13).unwrap(),
        );
        assert_eq!(context.alignment_span(), 6);

        assert_eq!(ReferenceSequenceContext::None.alignment_span(), 0);
    }
}
