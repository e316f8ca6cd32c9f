//! 1-based position.

use std::{
    error, fmt,
    num::{self, NonZeroUsize},
    str::FromStr,
};

/// A 1-based position.
///
/// A position cannot be 0, which allows [`Option<Position>`] to be the same
/// size as a `usize`.
///
/// # Examples
///
/// ```
/// use ramune_core::Position;
/// let position = Position::try_from(8)?;
/// assert_eq!(usize::from(position), 8);
/// # Ok::<_, ramune_core::position::TryFromIntError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Position(NonZeroUsize);

impl Position {
    /// The minimum value of a position.
    pub const MIN: Self = match Self::new(1) {
        Some(position) => position,
        None => unreachable!(),
    };

    /// The maximum value of a position.
    pub const MAX: Self = match Self::new(usize::MAX) {
        Some(position) => position,
        None => unreachable!(),
    };

    /// Creates a position if the given value is not zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramune_core::Position;
    /// assert!(Position::new(8).is_some());
    /// assert!(Position::new(0).is_none());
    /// ```
    pub const fn new(n: usize) -> Option<Self> {
        match NonZeroUsize::new(n) {
            Some(m) => Some(Self(m)),
            None => None,
        }
    }

    /// Returns the value as a primitive type.
    pub const fn get(&self) -> usize {
        self.0.get()
    }

    /// Adds an unsigned integer to a position, checking for overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use ramune_core::Position;
    /// let position = Position::MIN;
    /// assert_eq!(position.checked_add(8), Position::new(9));
    /// assert!(Position::MAX.checked_add(1).is_none());
    /// ```
    pub fn checked_add(self, other: usize) -> Option<Self> {
        self.0.checked_add(other).map(Self)
    }

    /// Subtracts an unsigned integer from a position, checking for underflow.
    pub fn checked_sub(self, other: usize) -> Option<Self> {
        self.0
            .get()
            .checked_sub(other)
            .and_then(NonZeroUsize::new)
            .map(Self)
    }
}

/// An error returned when a raw value fails to convert to a position.
pub type TryFromIntError = num::TryFromIntError;

impl TryFrom<usize> for Position {
    type Error = TryFromIntError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::try_from(n).map(Self)
    }
}

impl From<Position> for usize {
    fn from(position: Position) -> Self {
        position.0.get()
    }
}

/// An error returned when a position fails to parse.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The input failed to parse as an integer.
    Parse(num::ParseIntError),
    /// The value is invalid.
    Invalid(TryFromIntError),
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(_) => "parse error".fmt(f),
            Self::Invalid(_) => "invalid value".fmt(f),
        }
    }
}

impl FromStr for Position {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s.parse().map_err(ParseError::Parse)?;
        Self::try_from(n).map_err(ParseError::Invalid)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        assert_eq!(Position::new(0), None);
        assert_eq!(Position::new(8).map(usize::from), Some(8));
    }

    #[test]
    fn test_checked_add() {
        let position = Position::try_from(1).unwrap();
        assert_eq!(position.checked_add(7), Position::new(8));
        assert!(Position::MAX.checked_add(1).is_none());
    }

    #[test]
    fn test_checked_sub() {
        let position = Position::try_from(8).unwrap();
        assert_eq!(position.checked_sub(7), Position::new(1));
        assert!(position.checked_sub(8).is_none());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("8".parse(), Ok(Position::try_from(8).unwrap()));
        assert!(matches!("".parse::<Position>(), Err(ParseError::Parse(_))));
        assert!(matches!("x".parse::<Position>(), Err(ParseError::Parse(_))));
    }

    #[test]
    fn test_ord() {
        let a = Position::try_from(5).unwrap();
        let b = Position::try_from(8).unwrap();
        assert!(a < b);
    }
}
