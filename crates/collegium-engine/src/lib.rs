//! Member role transition orchestration.
//!
//! The engine performs single-request transitions ([`TransitionEngine`]),
//! batch runs with per-item failure isolation ([`BulkRunner`]), read-only
//! previews, and repair of legacy member references ([`Reconciler`]).
//! It is generic over the `collegium-core` repository traits and carries
//! no connection state of its own.

pub mod bulk;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod reconcile;

pub use bulk::{BulkPolicy, BulkReport, BulkRunner, PreviewReport};
pub use config::EngineConfig;
pub use engine::{ApprovedTransition, TransitionEngine, TransitionOutcome};
pub use error::{EngineError, EngineResult};
pub use notify::{Notifier, NullNotifier, TransitionNotice};
pub use reconcile::{ReconciliationReport, Reconciler};
