//! # Validated Scalars
//!
//! [`Capacity`] is the carrying capacity of a truck or the capacity a
//! shipment requires; both are positive integers in the same weight unit.
//! [`Label`] is a non-blank display string used for driver names and
//! shipment titles.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A strictly positive weight capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Capacity(i64);

impl Capacity {
    /// Validate a raw capacity. Zero and negative values are rejected.
    pub fn new(raw: i64) -> Result<Self, ValidationError> {
        if raw <= 0 {
            return Err(ValidationError::NonPositiveCapacity(raw));
        }
        Ok(Self(raw))
    }

    /// The raw value.
    pub fn get(&self) -> i64 {
        self.0
    }

    /// Whether a truck of this capacity can carry a load requiring `required`.
    pub fn can_carry(&self, required: Capacity) -> bool {
        self.0 >= required.0
    }
}

impl TryFrom<i64> for Capacity {
    type Error = ValidationError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Capacity> for i64 {
    fn from(c: Capacity) -> Self {
        c.0
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-blank, trimmed display string (driver name, shipment title).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Maximum accepted length in characters.
    pub const MAX_LEN: usize = 256;

    /// Validate a label. `field` names the input in the error message.
    pub fn new(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField(field));
        }
        let len = trimmed.chars().count();
        if len > Self::MAX_LEN {
            return Err(ValidationError::FieldTooLong {
                field,
                max: Self::MAX_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Label {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new("label", &raw)
    }
}

impl From<Label> for String {
    fn from(l: Label) -> Self {
        l.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
