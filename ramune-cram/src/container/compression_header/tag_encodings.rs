use indexmap::IndexMap;

use super::encoding::{Encoding, codec::ByteArray};

/// Tag encodings keyed by `(tag, type)` packed into a single integer.
pub(crate) type TagEncodings = IndexMap<i32, Encoding<ByteArray>>;

/// Packs a two-byte tag and a value type byte into a tag encoding key.
pub(crate) fn key(tag: [u8; 2], ty: u8) -> i32 {
    (i32::from(tag[0]) << 16) | (i32::from(tag[1]) << 8) | i32::from(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        assert_eq!(key([b'N', b'H'], b'c'), 0x4e4863);
        assert_eq!(key([b'M', b'D'], b'Z'), 0x4d445a);
    }
}
