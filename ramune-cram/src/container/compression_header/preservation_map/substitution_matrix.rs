use std::{error, fmt};

/// A reference base the substitution matrix is keyed on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Base {
    A,
    C,
    G,
    T,
    N,
}

impl Base {
    // Substitution codes for each reference base cover the other four bases
    // in this fixed order.
    fn substitution_alphabet(self) -> [Base; 4] {
        match self {
            Self::A => [Self::C, Self::G, Self::T, Self::N],
            Self::C => [Self::A, Self::G, Self::T, Self::N],
            Self::G => [Self::A, Self::C, Self::T, Self::N],
            Self::T => [Self::A, Self::C, Self::G, Self::N],
            Self::N => [Self::A, Self::C, Self::G, Self::T],
        }
    }
}

/// An error returned when a byte is not a known base.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TryFromByteError(u8);

impl error::Error for TryFromByteError {}

impl fmt::Display for TryFromByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid base: {:#04x}", self.0)
    }
}

impl TryFrom<u8> for Base {
    type Error = TryFromByteError;

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        match b.to_ascii_uppercase() {
            b'A' => Ok(Self::A),
            b'C' => Ok(Self::C),
            b'G' => Ok(Self::G),
            b'T' => Ok(Self::T),
            b'N' => Ok(Self::N),
            _ => Err(TryFromByteError(b)),
        }
    }
}

impl From<Base> for u8 {
    fn from(base: Base) -> Self {
        match base {
            Base::A => b'A',
            Base::C => b'C',
            Base::G => b'G',
            Base::T => b'T',
            Base::N => b'N',
        }
    }
}

const BASES: [Base; 5] = [Base::A, Base::C, Base::G, Base::T, Base::N];

/// The 5x4 base substitution matrix: for each reference base, the read base
/// each 2-bit substitution code resolves to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SubstitutionMatrix {
    substitutions: [[Base; 4]; 5],
}

impl SubstitutionMatrix {
    /// Returns the read base for a reference base and substitution code.
    pub fn get(&self, reference_base: Base, code: u8) -> Base {
        self.substitutions[reference_base as usize][usize::from(code & 0x03)]
    }

    /// Returns the substitution code mapping a reference base to a read
    /// base.
    ///
    /// Substituting a base for itself has no code; this falls back to code
    /// 0 in that case, matching the writer's refusal to emit such features.
    pub fn find(&self, reference_base: Base, read_base: Base) -> u8 {
        self.substitutions[reference_base as usize]
            .iter()
            .position(|&base| base == read_base)
            .map(|i| i as u8)
            .unwrap_or(0)
    }

    /// Packs the matrix into five bytes, one per reference base.
    ///
    /// Each byte holds the 2-bit code of every substitutable base, in the
    /// fixed per-row alphabet order.
    pub fn encode(&self) -> [u8; 5] {
        let mut dst = [0; 5];

        for (row, &reference_base) in BASES.iter().enumerate() {
            for (i, &base) in reference_base.substitution_alphabet().iter().enumerate() {
                let code = self.find(reference_base, base);
                dst[row] |= code << (6 - 2 * i);
            }
        }

        dst
    }

    /// Unpacks a matrix from five bytes.
    pub fn decode(src: [u8; 5]) -> Self {
        let mut substitutions = SubstitutionMatrix::default().substitutions;

        for (row, &reference_base) in BASES.iter().enumerate() {
            for (i, &base) in reference_base.substitution_alphabet().iter().enumerate() {
                let code = (src[row] >> (6 - 2 * i)) & 0x03;
                substitutions[row][usize::from(code)] = base;
            }
        }

        Self { substitutions }
    }
}

impl Default for SubstitutionMatrix {
    fn default() -> Self {
        Self {
            substitutions: [
                Base::A.substitution_alphabet(),
                Base::C.substitution_alphabet(),
                Base::G.substitution_alphabet(),
                Base::T.substitution_alphabet(),
                Base::N.substitution_alphabet(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let matrix = SubstitutionMatrix::default();
        let encoded = matrix.encode();

        // The identity permutation packs each row as codes 0..3.
        assert_eq!(encoded, [0x1b; 5]);
        assert_eq!(SubstitutionMatrix::decode(encoded), matrix);
    }

    #[test]
    fn test_get_and_find_are_inverse() {
        let matrix = SubstitutionMatrix::default();

        for &reference_base in &BASES {
            for &read_base in &reference_base.substitution_alphabet() {
                let code = matrix.find(reference_base, read_base);
                assert_eq!(matrix.get(reference_base, code), read_base);
            }
        }
    }

    #[test]
    fn test_decode_with_permuted_row() {
        // Row A with codes C=1, G=0, T=2, N=3.
        let mut encoded = SubstitutionMatrix::default().encode();
        encoded[0] = 0b01_00_10_11;

        let matrix = SubstitutionMatrix::decode(encoded);

        assert_eq!(matrix.get(Base::A, 0), Base::G);
        assert_eq!(matrix.get(Base::A, 1), Base::C);
        assert_eq!(matrix.get(Base::A, 2), Base::T);
        assert_eq!(matrix.get(Base::A, 3), Base::N);
        assert_eq!(matrix.find(Base::A, Base::C), 1);
    }
}
