//! Energy+ Core - Shared types library.
//!
//! This crate provides common types used across all Energy+ components:
//! - `server` - JSON API and the ranking/statistics engine
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, roles and
//!   friendship statuses, plus the walk energy conversion

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
