//! Domain models, repository traits, and request validation for the
//! member role transition subsystem.
//!
//! This crate has no persistence dependency; store implementations live
//! in `collegium-db` and orchestration in `collegium-engine`.

pub mod error;
pub mod models;
pub mod repository;
pub mod validation;

pub use error::{CollegiumError, CollegiumResult};
