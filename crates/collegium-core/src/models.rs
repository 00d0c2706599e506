//! Domain models for Collegium.
//!
//! These are the core types shared across all crates.

pub mod member;
pub mod transition;
