use std::{error, fmt};

/// A block compression method.
///
/// This is a closed set; unknown method bytes are rejected at block read
/// time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum CompressionMethod {
    /// Uncompressed.
    #[default]
    None,
    /// gzip.
    Gzip,
    /// bzip2.
    Bzip2,
    /// xz-container LZMA.
    Lzma,
    /// rANS static 4x8 (order 0/1).
    Rans4x8,
    /// rANS Nx16 with optional pack/RLE/stripe transforms.
    RansNx16,
    /// Adaptive arithmetic coding (recognized, not supported).
    AdaptiveArithmeticCoding,
    /// fqzcomp quality codec (recognized, not supported).
    Fqzcomp,
    /// tok3 read name tokenizer.
    NameTokenizer,
}

/// An error returned when a byte fails to convert to a compression method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TryFromByteError(u8);

impl error::Error for TryFromByteError {}

impl fmt::Display for TryFromByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid compression method: {}", self.0)
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = TryFromByteError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Bzip2),
            3 => Ok(Self::Lzma),
            4 => Ok(Self::Rans4x8),
            5 => Ok(Self::RansNx16),
            6 => Ok(Self::AdaptiveArithmeticCoding),
            7 => Ok(Self::Fqzcomp),
            8 => Ok(Self::NameTokenizer),
            _ => Err(TryFromByteError(b)),
        }
    }
}

impl From<CompressionMethod> for u8 {
    fn from(method: CompressionMethod) -> Self {
        match method {
            CompressionMethod::None => 0,
            CompressionMethod::Gzip => 1,
            CompressionMethod::Bzip2 => 2,
            CompressionMethod::Lzma => 3,
            CompressionMethod::Rans4x8 => 4,
            CompressionMethod::RansNx16 => 5,
            CompressionMethod::AdaptiveArithmeticCoding => 6,
            CompressionMethod::Fqzcomp => 7,
            CompressionMethod::NameTokenizer => 8,
        }
    }
}
