//! Single-request transition orchestration.

use collegium_core::error::{CollegiumError, CollegiumResult};
use collegium_core::models::member::{Member, Role, TransitionFields};
use collegium_core::models::transition::{MemberRef, RequestStatus, TransitionRequest};
use collegium_core::repository::{MemberRepository, TransitionRequestRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::notify::{Notifier, TransitionNotice};

/// Result of applying one transition request.
///
/// Expected conditions are outcomes, not errors: the engine returns
/// `Err` only for persistence failures.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Approved(ApprovedTransition),
    /// The member reference did not resolve: either the member record
    /// is gone, or the reference is still in the legacy string form
    /// and needs reconciliation first. The request is marked Failed.
    MemberNotFound { request_id: Uuid, reference: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovedTransition {
    pub request_id: Uuid,
    pub member_id: Uuid,
    pub display_name: String,
    pub previous_role: Role,
    pub new_role: Role,
    /// True when any submitted field fell back to the placeholder.
    pub incomplete: bool,
}

/// Performs exactly one member's role transition, atomically from the
/// caller's point of view.
///
/// Generic over repository implementations so the engine has no
/// dependency on the database crate.
pub struct TransitionEngine<M, R, N> {
    members: M,
    requests: R,
    notifier: N,
    config: EngineConfig,
}

impl<M, R, N> TransitionEngine<M, R, N>
where
    M: MemberRepository,
    R: TransitionRequestRepository,
    N: Notifier,
{
    pub fn new(members: M, requests: R, notifier: N, config: EngineConfig) -> Self {
        Self {
            members,
            requests,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Wrap a store operation in the configured timeout. A timeout
    /// surfaces as a database error, never as assumed success.
    async fn op<T>(
        &self,
        what: &str,
        fut: impl Future<Output = CollegiumResult<T>>,
    ) -> CollegiumResult<T> {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CollegiumError::Database(format!("{what} timed out"))),
        }
    }

    pub(crate) async fn fetch_pending(&self) -> EngineResult<Vec<TransitionRequest>> {
        Ok(self
            .op(
                "pending request fetch",
                self.requests.find_by_status(RequestStatus::Pending),
            )
            .await?)
    }

    /// Member display name for reporting; `None` when the record is
    /// absent.
    pub(crate) async fn resolve_display_name(&self, id: Uuid) -> EngineResult<Option<String>> {
        match self.op("member lookup", self.members.get_by_id(id)).await {
            Ok(member) => Ok(Some(member.full_name)),
            Err(CollegiumError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Single-item variant for manual/targeted approval. Unlike batch
    /// processing, a missing request here is an error: the caller named
    /// a specific record.
    pub async fn apply_by_id(&self, request_id: Uuid) -> EngineResult<TransitionOutcome> {
        let request = match self
            .op("request lookup", self.requests.get_by_id(request_id))
            .await
        {
            Ok(r) => r,
            Err(CollegiumError::NotFound { .. }) => {
                return Err(EngineError::RequestNotFound(request_id));
            }
            Err(e) => return Err(e.into()),
        };

        self.apply_transition(&request).await
    }

    /// Perform one role transition and report a typed outcome.
    ///
    /// Member update and request deletion happen in a single store
    /// transaction; on persistence failure the request is marked
    /// Failed best-effort and the error is surfaced to the caller.
    pub async fn apply_transition(
        &self,
        request: &TransitionRequest,
    ) -> EngineResult<TransitionOutcome> {
        let member = match &request.member {
            MemberRef::Key(id) => {
                match self.op("member lookup", self.members.get_by_id(*id)).await {
                    Ok(m) => Some(m),
                    Err(CollegiumError::NotFound { .. }) => None,
                    Err(e) => return Err(e.into()),
                }
            }
            // Legacy string reference: cannot be resolved until
            // reconciliation rewrites it.
            MemberRef::Raw(_) => None,
        };

        let Some(member) = member else {
            return self.fail_unresolved(request).await;
        };

        let previous_role = member.role;
        let new_role = previous_role.transition_target();

        let (specialty, specialty_filled) = self.fill(&request.specialty);
        let (license_number, license_filled) = self.fill(&request.license_number);
        let incomplete = specialty_filled || license_filled;

        let fields = TransitionFields {
            role: new_role,
            region: request.region.clone(),
            specialty,
            license_number,
            clear_student_fields: previous_role == Role::Student,
        };

        let updated: Member = match self
            .op(
                "transition approval",
                self.requests.approve(request.id, member.id, fields),
            )
            .await
        {
            Ok(m) => m,
            Err(e) => {
                // Best effort: the safe resting state is Pending if
                // this write fails too.
                if let Err(mark) = self
                    .op(
                        "request failure mark",
                        self.requests.set_status(request.id, RequestStatus::Failed),
                    )
                    .await
                {
                    warn!(
                        request_id = %request.id,
                        error = %mark,
                        "could not mark request failed after persistence error"
                    );
                }
                return Err(e.into());
            }
        };

        info!(
            request_id = %request.id,
            member_id = %updated.id,
            from = %previous_role,
            to = %new_role,
            incomplete,
            "transition approved"
        );

        self.notifier
            .notify(TransitionNotice::Approved {
                request_id: request.id,
                member_id: updated.id,
                display_name: updated.full_name.clone(),
                previous_role,
                new_role,
            })
            .await;

        Ok(TransitionOutcome::Approved(ApprovedTransition {
            request_id: request.id,
            member_id: updated.id,
            display_name: updated.full_name,
            previous_role,
            new_role,
            incomplete,
        }))
    }

    async fn fail_unresolved(&self, request: &TransitionRequest) -> EngineResult<TransitionOutcome> {
        let reference = request.member.to_string();
        warn!(
            request_id = %request.id,
            reference = %reference,
            "member reference did not resolve"
        );

        self.op(
            "request failure mark",
            self.requests.set_status(request.id, RequestStatus::Failed),
        )
        .await?;

        self.notifier
            .notify(TransitionNotice::MemberNotFound {
                request_id: request.id,
                reference: reference.clone(),
            })
            .await;

        Ok(TransitionOutcome::MemberNotFound {
            request_id: request.id,
            reference,
        })
    }

    /// Substitute the placeholder for blank submissions. Returns the
    /// resolved value and whether a fallback occurred.
    fn fill(&self, submitted: &str) -> (String, bool) {
        if submitted.trim().is_empty() {
            (self.config.placeholder.clone(), true)
        } else {
            (submitted.to_string(), false)
        }
    }
}
