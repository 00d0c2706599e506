//! Batch processing of pending transition requests.
//!
//! Requests are processed sequentially and in fetch order: failure
//! attribution stays exact and the report is deterministic. One item's
//! failure never aborts the rest of the batch.
//!
//! There is no embedded confirmation delay; the destructive-run
//! safeguard is the two-call protocol: inspect [`BulkRunner::preview`]
//! first, then invoke [`BulkRunner::run_bulk`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use collegium_core::models::member::Role;
use collegium_core::models::transition::MemberRef;
use collegium_core::repository::{MemberRepository, TransitionRequestRepository};
use collegium_core::validation::{self, InvalidField};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{TransitionEngine, TransitionOutcome};
use crate::error::EngineResult;
use crate::notify::Notifier;

/// Selection policy for a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkPolicy {
    /// Transition every pending request; blank fields get the
    /// placeholder. Trades data quality for throughput.
    All,
    /// Transition only requests whose fields all pass validation; the
    /// rest stay pending and are enumerated in the report.
    ValidOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub request_id: Uuid,
    pub member_id: Option<Uuid>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub request_id: Uuid,
    pub reasons: Vec<InvalidField>,
}

/// Count of transitions along one role edge.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EdgeCount {
    pub from: Role,
    pub to: Role,
    pub count: usize,
}

/// Aggregate result of one bulk run. Always produced, even when zero
/// items were eligible, so "nothing to do" and "everything failed" are
/// distinguishable outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub approved: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Approvals where a blank field fell back to the placeholder.
    pub approved_incomplete: usize,
    pub edges: Vec<EdgeCount>,
    /// Per-item failures, in processing order.
    pub errors: Vec<ItemError>,
    /// Requests left pending under `ValidOnly`, in processing order.
    pub skipped_items: Vec<SkippedItem>,
    pub cancelled: bool,
}

/// Summary of what a bulk run would do, without mutating anything.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreviewReport {
    pub pending: usize,
    pub valid: usize,
    pub invalid_license_only: usize,
    pub invalid_specialty_only: usize,
    pub invalid_both: usize,
    /// Requests whose region is blank; counted regardless of bucket.
    pub invalid_region: usize,
    pub samples: PreviewSamples,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreviewSamples {
    pub valid: Vec<PreviewItem>,
    pub invalid_license_only: Vec<PreviewItem>,
    pub invalid_specialty_only: Vec<PreviewItem>,
    pub invalid_both: Vec<PreviewItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewItem {
    pub request_id: Uuid,
    /// Resolved against the member store; `None` when the reference is
    /// dangling or still in the legacy string form.
    pub display_name: Option<String>,
    pub reasons: Vec<InvalidField>,
}

/// Drives the [`TransitionEngine`] across every pending request.
pub struct BulkRunner<M, R, N> {
    engine: TransitionEngine<M, R, N>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<M, R, N> BulkRunner<M, R, N>
where
    M: MemberRepository,
    R: TransitionRequestRepository,
    N: Notifier,
{
    pub fn new(engine: TransitionEngine<M, R, N>) -> Self {
        Self {
            engine,
            cancel: None,
        }
    }

    /// Install a cooperative cancellation flag. It is checked between
    /// items only; an in-flight transition always finishes first.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn engine(&self) -> &TransitionEngine<M, R, N> {
        &self.engine
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run the engine over every pending request under the given
    /// policy. No retries; retry is an operator decision made after
    /// reading the report.
    pub async fn run_bulk(&self, policy: BulkPolicy) -> EngineResult<BulkReport> {
        let pending = self.engine.fetch_pending().await?;
        info!(total = pending.len(), ?policy, "starting bulk transition run");

        let mut report = BulkReport::default();

        for request in &pending {
            if self.cancelled() {
                report.cancelled = true;
                break;
            }

            if policy == BulkPolicy::ValidOnly {
                let validity = validation::classify(request);
                if !validity.valid {
                    report.skipped += 1;
                    report.skipped_items.push(SkippedItem {
                        request_id: request.id,
                        reasons: validity.reasons,
                    });
                    continue;
                }
            }

            match self.engine.apply_transition(request).await {
                Ok(TransitionOutcome::Approved(approved)) => {
                    report.approved += 1;
                    if approved.incomplete {
                        report.approved_incomplete += 1;
                    }
                    bump_edge(&mut report.edges, approved.previous_role, approved.new_role);
                }
                Ok(TransitionOutcome::MemberNotFound {
                    request_id,
                    reference,
                }) => {
                    report.failed += 1;
                    report.errors.push(ItemError {
                        request_id,
                        member_id: None,
                        error: format!("member not found: {reference}"),
                    });
                }
                Err(e) => {
                    warn!(request_id = %request.id, error = %e, "transition failed");
                    report.failed += 1;
                    report.errors.push(ItemError {
                        request_id: request.id,
                        member_id: request.member.key(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            approved = report.approved,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "bulk transition run finished"
        );
        Ok(report)
    }

    /// Report what a bulk run would do. Read-only: never calls the
    /// engine's apply path, never writes.
    pub async fn preview(&self) -> EngineResult<PreviewReport> {
        let pending = self.engine.fetch_pending().await?;
        let limit = self.engine.config().preview_sample_size;

        let mut report = PreviewReport {
            pending: pending.len(),
            ..Default::default()
        };

        for request in &pending {
            let validity = validation::classify(request);

            if validity.reasons.contains(&InvalidField::Region) {
                report.invalid_region += 1;
            }

            let bad_license = validity.reasons.contains(&InvalidField::License);
            let bad_specialty = validity.reasons.contains(&InvalidField::Specialty);

            let (count, bucket) = if validity.valid {
                (&mut report.valid, &mut report.samples.valid)
            } else if bad_license && bad_specialty {
                (&mut report.invalid_both, &mut report.samples.invalid_both)
            } else if bad_license {
                (
                    &mut report.invalid_license_only,
                    &mut report.samples.invalid_license_only,
                )
            } else if bad_specialty {
                (
                    &mut report.invalid_specialty_only,
                    &mut report.samples.invalid_specialty_only,
                )
            } else {
                // Region-only failure: counted above, no sample bucket.
                continue;
            };

            *count += 1;
            if bucket.len() < limit {
                let display_name = match &request.member {
                    MemberRef::Key(id) => self.engine.resolve_display_name(*id).await?,
                    MemberRef::Raw(_) => None,
                };
                bucket.push(PreviewItem {
                    request_id: request.id,
                    display_name,
                    reasons: validity.reasons,
                });
            }
        }

        Ok(report)
    }
}

fn bump_edge(edges: &mut Vec<EdgeCount>, from: Role, to: Role) {
    if let Some(edge) = edges.iter_mut().find(|e| e.from == from && e.to == to) {
        edge.count += 1;
    } else {
        edges.push(EdgeCount { from, to, count: 1 });
    }
}
