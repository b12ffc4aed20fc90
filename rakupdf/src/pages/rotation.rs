//! Quarter-turn page rotation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use thiserror::Error;

/// Error returned when an angle is not a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid rotation: {0} degrees (must be a multiple of 90)")]
pub struct RotationError(pub i64);

/// Page rotation angles.
///
/// Rotations add modulo 360, so applying `Clockwise90` four times returns
/// to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// Rotate 90 degrees clockwise.
    Clockwise90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (90 counter-clockwise).
    Clockwise270,
}

impl Rotation {
    /// Parse a rotation from degrees.
    ///
    /// Any multiple of 90 is accepted, including negative values, and is
    /// normalized into `0..360`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a multiple of 90.
    ///
    /// # Examples
    ///
    /// ```
    /// use rakupdf::pages::Rotation;
    ///
    /// assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::Clockwise270);
    /// assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::Clockwise90);
    /// assert!(Rotation::from_degrees(45).is_err());
    /// ```
    pub fn from_degrees(degrees: i64) -> Result<Self, RotationError> {
        if degrees % 90 != 0 {
            return Err(RotationError(degrees));
        }

        Ok(Self::from_quarter_turns(degrees / 90))
    }

    fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            1 => Self::Clockwise90,
            2 => Self::Rotate180,
            3 => Self::Clockwise270,
            _ => Self::None,
        }
    }

    /// Get rotation as degrees in `0..360`.
    pub fn as_degrees(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// Whether this is the identity rotation.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Add this rotation to an existing `/Rotate` value.
    ///
    /// The result is normalized into `0..360` even when `existing` is
    /// negative or not a multiple of 90.
    pub fn apply_to(&self, existing: i64) -> i64 {
        (existing + self.as_degrees()).rem_euclid(360)
    }
}

impl Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        Rotation::from_quarter_turns((self.as_degrees() + rhs.as_degrees()) / 90)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = RotationError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.as_degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.as_degrees())
    }
}
