//! tok3 read name codec.
//!
//! Names are split into alphanumeric/separator tokens and modeled against a
//! previous name: matching tokens, small numeric deltas, and duplicates of
//! whole names are stored as references. Each token position produces a set
//! of typed byte streams, individually entropy coded with rANS Nx16.

mod decode;
mod encode;

pub use self::{decode::decode, encode::encode};

const NUL: u8 = 0x00;

// Stream type byte modifiers.
const NEW_POSITION: u8 = 0x80;
const DUP_STREAM: u8 = 0x40;

/// A token stream type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Type {
    /// The per-position token type stream.
    Type,
    /// A NUL-terminated string token.
    String,
    /// A single character token.
    Char,
    /// A zero-padded digit token (value stream).
    Digits0,
    /// A zero-padded digit token (width stream).
    DZLen,
    /// A whole-name duplicate of an earlier name.
    Dup,
    /// A diff against an earlier name.
    Diff,
    /// A digit token.
    Digits,
    /// A small delta against the previous name's digit token.
    Delta,
    /// A small delta against the previous name's zero-padded digit token.
    Delta0,
    /// The token matches the previous name's token exactly.
    Match,
    /// No token.
    Nop,
    /// End of name.
    End,
}

impl From<Type> for u8 {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Type => 0,
            Type::String => 1,
            Type::Char => 2,
            Type::Digits0 => 3,
            Type::DZLen => 4,
            Type::Dup => 5,
            Type::Diff => 6,
            Type::Digits => 7,
            Type::Delta => 8,
            Type::Delta0 => 9,
            Type::Match => 10,
            Type::Nop => 11,
            Type::End => 12,
        }
    }
}

impl TryFrom<u8> for Type {
    type Error = std::io::Error;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b {
            0 => Ok(Self::Type),
            1 => Ok(Self::String),
            2 => Ok(Self::Char),
            3 => Ok(Self::Digits0),
            4 => Ok(Self::DZLen),
            5 => Ok(Self::Dup),
            6 => Ok(Self::Diff),
            7 => Ok(Self::Digits),
            8 => Ok(Self::Delta),
            9 => Ok(Self::Delta0),
            10 => Ok(Self::Match),
            11 => Ok(Self::Nop),
            12 => Ok(Self::End),
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid token stream type: {b}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn t(src: &[u8]) -> io::Result<()> {
        let compressed = encode(src)?;
        let actual = decode(&compressed)?;
        assert_eq!(actual, src);
        Ok(())
    }

    #[test]
    fn test_round_trip() -> io::Result<()> {
        t(b"r1\x00r2\x00r3\x00")?;
        t(b"read.1\x00read.2\x00read.3\x00read.10\x00")?;
        t(b"SRR003929.1\x00SRR003929.2\x00SRR003929.47\x00")?;
        Ok(())
    }

    #[test]
    fn test_round_trip_with_duplicate_names() -> io::Result<()> {
        t(b"pair.1\x00pair.1\x00pair.2\x00pair.2\x00")
    }

    #[test]
    fn test_round_trip_with_padded_digits() -> io::Result<()> {
        t(b"L001:0007\x00L001:0008\x00L001:0123\x00")
    }

    #[test]
    fn test_round_trip_with_mixed_shapes() -> io::Result<()> {
        t(b"a\x00completely:different*54\x00a9\x00")
    }

    #[test]
    fn test_round_trip_without_trailing_nul() -> io::Result<()> {
        t(b"r1\x00r2")
    }

    #[test]
    fn test_round_trip_empty() -> io::Result<()> {
        t(b"")
    }

    #[test]
    fn test_decode_rejects_arithmetic_streams() {
        // ulen = 0, n_names = 0, use_arith = 1
        let src = [0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            decode(&src),
            Err(e) if e.kind() == io::ErrorKind::Unsupported,
        ));
    }
}
