//! Engine configuration.

use std::time::Duration;

/// Configuration for the transition engine and its orchestrators.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Placeholder written into fields the applicant left blank. An
    /// incomplete submission still produces a deterministic value; no
    /// field is ever left absent after a transition.
    pub placeholder: String,
    /// Per-store-operation timeout. A timeout is a persistence failure
    /// and is never assumed to mean the write went through.
    pub op_timeout: Duration,
    /// How many requests from each preview bucket are resolved against
    /// the member store for display.
    pub preview_sample_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placeholder: "Awaiting".into(),
            op_timeout: Duration::from_secs(30),
            preview_sample_size: 5,
        }
    }
}
