//! Folio Core - Shared domain types.
//!
//! This crate provides the types shared by every Folio component:
//! - `client` - Typed client for the site backend (shop, wallet, comments)
//! - `cli` - Command-line front end driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no HTTP
//! clients. All authority over prices, stock, and balances lives on the
//! backend; the types here only describe what the backend reports.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
