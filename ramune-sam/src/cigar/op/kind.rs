//! CIGAR operation kind.

use std::{error, fmt};

/// A CIGAR operation kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// An alignment match (`M`).
    Match,
    /// An insertion into the read (`I`).
    Insertion,
    /// A deletion from the read (`D`).
    Deletion,
    /// A skipped region from the reference (`N`).
    Skip,
    /// A soft-clipped region (`S`).
    SoftClip,
    /// A hard-clipped region (`H`).
    HardClip,
    /// Silent deletion from padded reference (`P`).
    Pad,
    /// A sequence match (`=`).
    SequenceMatch,
    /// A sequence mismatch (`X`).
    SequenceMismatch,
}

impl Kind {
    /// Returns whether the operation kind consumes read bases.
    pub fn consumes_read(&self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Insertion
                | Self::SoftClip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }

    /// Returns whether the operation kind consumes reference bases.
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            Self::Match
                | Self::Deletion
                | Self::Skip
                | Self::SequenceMatch
                | Self::SequenceMismatch
        )
    }
}

/// An error returned when a byte fails to convert to a CIGAR operation kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TryFromByteError(u8);

impl error::Error for TryFromByteError {}

impl fmt::Display for TryFromByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid CIGAR operation kind: {:#04x}", self.0)
    }
}

impl TryFrom<u8> for Kind {
    type Error = TryFromByteError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            b'M' => Ok(Self::Match),
            b'I' => Ok(Self::Insertion),
            b'D' => Ok(Self::Deletion),
            b'N' => Ok(Self::Skip),
            b'S' => Ok(Self::SoftClip),
            b'H' => Ok(Self::HardClip),
            b'P' => Ok(Self::Pad),
            b'=' => Ok(Self::SequenceMatch),
            b'X' => Ok(Self::SequenceMismatch),
            _ => Err(TryFromByteError(b)),
        }
    }
}

impl From<Kind> for char {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Match => 'M',
            Kind::Insertion => 'I',
            Kind::Deletion => 'D',
            Kind::Skip => 'N',
            Kind::SoftClip => 'S',
            Kind::HardClip => 'H',
            Kind::Pad => 'P',
            Kind::SequenceMatch => '=',
            Kind::SequenceMismatch => 'X',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_u8() {
        assert_eq!(Kind::try_from(b'M'), Ok(Kind::Match));
        assert_eq!(Kind::try_from(b'='), Ok(Kind::SequenceMatch));
        assert_eq!(Kind::try_from(b'!'), Err(TryFromByteError(b'!')));
    }

    #[test]
    fn test_consumes() {
        assert!(Kind::Match.consumes_read());
        assert!(Kind::Match.consumes_reference());
        assert!(Kind::Insertion.consumes_read());
        assert!(!Kind::Insertion.consumes_reference());
        assert!(!Kind::Deletion.consumes_read());
        assert!(Kind::Deletion.consumes_reference());
        assert!(!Kind::HardClip.consumes_read());
        assert!(!Kind::HardClip.consumes_reference());
    }
}
