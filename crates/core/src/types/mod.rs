//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod size;

pub use id::*;
pub use price::Price;
pub use size::{Size, SizeError};
