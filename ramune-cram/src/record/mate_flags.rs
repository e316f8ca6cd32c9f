bitflags::bitflags! {
    /// CRAM mate flags for detached records.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MateFlags: u8 {
        /// The mate is on the negative strand.
        const ON_NEGATIVE_STRAND = 0x01;
        /// The mate is unmapped.
        const UNMAPPED = 0x02;
    }
}

impl MateFlags {
    pub fn is_on_negative_strand(self) -> bool {
        self.contains(Self::ON_NEGATIVE_STRAND)
    }

    pub fn is_unmapped(self) -> bool {
        self.contains(Self::UNMAPPED)
    }
}

impl From<u8> for MateFlags {
    fn from(value: u8) -> Self {
        Self::from_bits_retain(value)
    }
}

impl From<MateFlags> for u8 {
    fn from(flags: MateFlags) -> Self {
        flags.bits()
    }
}
