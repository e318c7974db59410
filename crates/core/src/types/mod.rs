//! Core types for Folio.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Amount, AmountError, CURRENCY_SYMBOL, Money, round2};
pub use status::*;
pub use timestamp::{UNKNOWN_DATE, display_timestamp, parse_timestamp};
