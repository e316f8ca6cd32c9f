bitflags::bitflags! {
    /// CRAM record flags.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Flags: u8 {
        /// Quality scores are stored per base.
        const QUALITY_SCORES = 0x01;
        /// The record is detached: mate information is stored verbatim.
        const DETACHED = 0x02;
        /// The mate is a downstream record in the same slice.
        const MATE_DOWNSTREAM = 0x04;
        /// The sequence is missing and decodes as unknown bases.
        const SEQUENCE_MISSING = 0x08;
        /// The template length is stored verbatim.
        const EXPLICIT_TEMPLATE_LENGTH = 0x10;
    }
}

impl Flags {
    pub fn has_quality_scores(self) -> bool {
        self.contains(Self::QUALITY_SCORES)
    }

    pub fn is_detached(self) -> bool {
        self.contains(Self::DETACHED)
    }

    pub fn has_mate_downstream(self) -> bool {
        self.contains(Self::MATE_DOWNSTREAM)
    }

    pub fn is_sequence_missing(self) -> bool {
        self.contains(Self::SEQUENCE_MISSING)
    }

    pub fn has_explicit_template_length(self) -> bool {
        self.contains(Self::EXPLICIT_TEMPLATE_LENGTH)
    }
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

impl From<Flags> for u8 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Flags::from(0x03), Flags::QUALITY_SCORES | Flags::DETACHED);
        assert_eq!(u8::from(Flags::MATE_DOWNSTREAM), 0x04);
    }
}
