use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which foot (or feet) a footstep or support refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    /// Both feet on the ground (double support).
    Both,
}

impl Side {
    /// The opposite side. `Both` is its own opposite.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Both => Self::Both,
        }
    }

    /// Sign convention for lateral offsets: +1 for left, -1 for right.
    #[must_use]
    pub const fn lateral_sign(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
            Self::Both => 0.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Error returned when parsing an unknown side string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown side: {0:?} (expected \"left\", \"right\" or \"both\")")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "both" => Ok(Self::Both),
            other => Err(ParseSideError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_side() {
        assert_eq!(Side::Left.other(), Side::Right);
        assert_eq!(Side::Right.other(), Side::Left);
        assert_eq!(Side::Both.other(), Side::Both);
    }

    #[test]
    fn parse_sides() {
        assert_eq!("left".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("right".parse::<Side>().unwrap(), Side::Right);
        assert_eq!("both".parse::<Side>().unwrap(), Side::Both);
        assert!("up".parse::<Side>().is_err());
    }

    #[test]
    fn lateral_signs() {
        assert_eq!(Side::Left.lateral_sign(), 1.0);
        assert_eq!(Side::Right.lateral_sign(), -1.0);
    }
}
