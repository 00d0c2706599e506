//! Repair pass for legacy string member references.
//!
//! An earlier write path persisted the `member` reference on transition
//! requests as a plain string instead of the native record link, which
//! breaks the engine's lookup. This pass re-links every repairable
//! reference so a subsequent bulk run can distinguish "member really
//! gone" from "reference encoding bug". Idempotent: a second run finds
//! nothing left to fix.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use collegium_core::error::{CollegiumError, CollegiumResult};
use collegium_core::models::transition::MemberRef;
use collegium_core::repository::{MemberRepository, TransitionRequestRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconciliationReport {
    /// Legacy references rewritten to the native record link.
    pub fixed: usize,
    /// References that were already the native record link.
    pub already_correct: usize,
    /// Parseable references whose member does not exist. Left
    /// untouched; an operator-visible dead end.
    pub member_not_found: usize,
    /// References that do not parse as an identity key at all. Cannot
    /// be auto-repaired.
    pub malformed: usize,
    /// Items whose lookup or relink hit a store error. The scan keeps
    /// going; these rows stay in whatever form they were found.
    pub errors: usize,
    pub cancelled: bool,
}

/// Scans all transition requests and repairs legacy references.
pub struct Reconciler<M, R> {
    members: M,
    requests: R,
    op_timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl<M, R> Reconciler<M, R>
where
    M: MemberRepository,
    R: TransitionRequestRepository,
{
    pub fn new(members: M, requests: R, op_timeout: Duration) -> Self {
        Self {
            members,
            requests,
            op_timeout,
            cancel: None,
        }
    }

    /// Install a cooperative cancellation flag, checked between items.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    async fn op<T>(
        &self,
        what: &str,
        fut: impl Future<Output = CollegiumResult<T>>,
    ) -> CollegiumResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CollegiumError::Database(format!("{what} timed out"))),
        }
    }

    /// Detect and repair string-encoded member references across ALL
    /// transition requests (any status).
    pub async fn reconcile_member_references(&self) -> EngineResult<ReconciliationReport> {
        let requests = self.op("request scan", self.requests.find_all()).await?;
        info!(total = requests.len(), "starting reference reconciliation");

        let mut report = ReconciliationReport::default();

        for request in requests {
            if self.cancelled() {
                report.cancelled = true;
                break;
            }

            let raw = match &request.member {
                MemberRef::Key(_) => {
                    report.already_correct += 1;
                    continue;
                }
                MemberRef::Raw(s) => s,
            };

            let Ok(member_id) = Uuid::parse_str(raw.trim()) else {
                warn!(
                    request_id = %request.id,
                    reference = %raw,
                    "member reference does not parse as an identity key"
                );
                report.malformed += 1;
                continue;
            };

            // Per-item store errors are recorded, not propagated; one
            // bad row must not abort the scan or discard the counts.
            match self
                .op("member lookup", self.members.get_by_id(member_id))
                .await
            {
                Ok(member) => {
                    match self
                        .op(
                            "reference relink",
                            self.requests.relink_member(request.id, member.id),
                        )
                        .await
                    {
                        Ok(()) => {
                            info!(
                                request_id = %request.id,
                                member_id = %member.id,
                                "relinked member reference"
                            );
                            report.fixed += 1;
                        }
                        Err(e) => {
                            warn!(
                                request_id = %request.id,
                                error = %e,
                                "reference relink failed"
                            );
                            report.errors += 1;
                        }
                    }
                }
                Err(CollegiumError::NotFound { .. }) => {
                    report.member_not_found += 1;
                }
                Err(e) => {
                    warn!(
                        request_id = %request.id,
                        error = %e,
                        "member lookup failed"
                    );
                    report.errors += 1;
                }
            }
        }

        info!(
            fixed = report.fixed,
            already_correct = report.already_correct,
            member_not_found = report.member_not_found,
            malformed = report.malformed,
            errors = report.errors,
            cancelled = report.cancelled,
            "reconciliation finished"
        );
        Ok(report)
    }
}
