//! Core types for Energy+.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod energy;
pub mod id;
pub mod status;
pub mod username;

pub use energy::{MAX_WALK_KM, WH_PER_KM, energy_for_distance};
pub use id::*;
pub use status::*;
pub use username::{Username, UsernameError};
