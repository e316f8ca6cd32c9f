//! SAM record flags.

bitflags::bitflags! {
    /// SAM record flags.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Flags: u16 {
        /// Read is paired (`0x01`).
        const PAIRED = 0x01;
        /// Each segment is properly aligned (`0x02`).
        const PROPERLY_PAIRED = 0x02;
        /// Read is unmapped (`0x04`).
        const UNMAPPED = 0x04;
        /// The mate is unmapped (`0x08`).
        const MATE_UNMAPPED = 0x08;
        /// The sequence is reverse complemented (`0x10`).
        const REVERSE_COMPLEMENTED = 0x10;
        /// The sequence of the mate is reverse complemented (`0x20`).
        const MATE_REVERSE_COMPLEMENTED = 0x20;
        /// First of pair (`0x40`).
        const FIRST_OF_PAIR = 0x40;
        /// Last of pair (`0x80`).
        const LAST_OF_PAIR = 0x80;
        /// Secondary alignment (`0x100`).
        const SECONDARY = 0x100;
        /// Read fails platform/vendor quality checks (`0x200`).
        const QC_FAIL = 0x200;
        /// PCR or optical duplicate (`0x400`).
        const DUPLICATE = 0x400;
        /// Supplementary alignment (`0x800`).
        const SUPPLEMENTARY = 0x800;
    }
}

impl Flags {
    /// Returns whether the `PAIRED` flag is set.
    pub fn is_paired(self) -> bool {
        self.contains(Self::PAIRED)
    }

    /// Returns whether the `UNMAPPED` flag is set.
    pub fn is_unmapped(self) -> bool {
        self.contains(Self::UNMAPPED)
    }

    /// Returns whether the `MATE_UNMAPPED` flag is set.
    pub fn is_mate_unmapped(self) -> bool {
        self.contains(Self::MATE_UNMAPPED)
    }

    /// Returns whether the `REVERSE_COMPLEMENTED` flag is set.
    pub fn is_reverse_complemented(self) -> bool {
        self.contains(Self::REVERSE_COMPLEMENTED)
    }

    /// Returns whether the `MATE_REVERSE_COMPLEMENTED` flag is set.
    pub fn is_mate_reverse_complemented(self) -> bool {
        self.contains(Self::MATE_REVERSE_COMPLEMENTED)
    }

    /// Returns whether the `FIRST_OF_PAIR` flag is set.
    pub fn is_first_of_pair(self) -> bool {
        self.contains(Self::FIRST_OF_PAIR)
    }

    /// Returns whether the `LAST_OF_PAIR` flag is set.
    pub fn is_last_of_pair(self) -> bool {
        self.contains(Self::LAST_OF_PAIR)
    }

    /// Returns whether the `SECONDARY` flag is set.
    pub fn is_secondary(self) -> bool {
        self.contains(Self::SECONDARY)
    }

    /// Returns whether the `SUPPLEMENTARY` flag is set.
    pub fn is_supplementary(self) -> bool {
        self.contains(Self::SUPPLEMENTARY)
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::UNMAPPED
    }
}

impl From<u16> for Flags {
    fn from(value: u16) -> Self {
        Self::from_bits_retain(value)
    }
}

impl From<Flags> for u16 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(Flags::default(), Flags::UNMAPPED);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Flags::from(0x41), Flags::PAIRED | Flags::FIRST_OF_PAIR);
        assert_eq!(u16::from(Flags::PAIRED | Flags::LAST_OF_PAIR), 0x81);
    }

    #[test]
    fn test_predicates() {
        let flags = Flags::PAIRED | Flags::MATE_UNMAPPED;
        assert!(flags.is_paired());
        assert!(flags.is_mate_unmapped());
        assert!(!flags.is_unmapped());
    }
}
