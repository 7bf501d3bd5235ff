//! Product size label type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// No size was selected (empty or whitespace-only input).
    #[error("size cannot be empty")]
    Empty,
}

/// A size label such as `"M"` or `"XL"`.
///
/// Sizes are free-form labels chosen by the catalog; the only constraint is
/// that a shopper actually picked one.
///
/// ## Examples
///
/// ```
/// use cartwheel_core::Size;
///
/// assert!(Size::parse("M").is_ok());
/// assert!(Size::parse("").is_err());
/// assert!(Size::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Size(String);

impl Size {
    /// Parse a `Size` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Empty`] if the input is empty or only whitespace.
    pub fn parse(s: &str) -> Result<Self, SizeError> {
        if s.trim().is_empty() {
            return Err(SizeError::Empty);
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the size label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Size {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::borrow::Borrow<str> for Size {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl core::str::FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
