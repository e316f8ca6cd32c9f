use std::{error, fmt};

/// A block content type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum ContentType {
    /// The SAM header block.
    #[default]
    FileHeader,
    /// A compression header block.
    CompressionHeader,
    /// A slice header block.
    SliceHeader,
    /// Reserved.
    Reserved,
    /// An external data block.
    ExternalData,
    /// The core bitstream block.
    CoreData,
}

/// An error returned when a byte fails to convert to a content type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TryFromByteError(u8);

impl error::Error for TryFromByteError {}

impl fmt::Display for TryFromByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid content type: {}", self.0)
    }
}

impl TryFrom<u8> for ContentType {
    type Error = TryFromByteError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Self::FileHeader),
            1 => Ok(Self::CompressionHeader),
            2 => Ok(Self::SliceHeader),
            3 => Ok(Self::Reserved),
            4 => Ok(Self::ExternalData),
            5 => Ok(Self::CoreData),
            _ => Err(TryFromByteError(b)),
        }
    }
}

impl From<ContentType> for u8 {
    fn from(content_type: ContentType) -> Self {
        match content_type {
            ContentType::FileHeader => 0,
            ContentType::CompressionHeader => 1,
            ContentType::SliceHeader => 2,
            ContentType::Reserved => 3,
            ContentType::ExternalData => 4,
            ContentType::CoreData => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        for b in 0..=5 {
            let content_type = ContentType::try_from(b).unwrap();
            assert_eq!(u8::from(content_type), b);
        }

        assert!(ContentType::try_from(6).is_err());
    }
}
