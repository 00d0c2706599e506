//! Transition request domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a transition request.
///
/// Successful transitions DELETE the request, so completion is
/// represented by absence. `Completed` exists for external writers
/// only; this subsystem never stores it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Completed,
    Failed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Completed => "Completed",
            RequestStatus::Failed => "Failed",
        }
    }
}

/// Reference from a transition request to a member.
///
/// `Key` is the native record link. `Raw` is the legacy corrupt form
/// where an earlier write path persisted the reference as a plain
/// string; the engine cannot resolve it until reconciliation rewrites
/// the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberRef {
    Key(Uuid),
    Raw(String),
}

impl MemberRef {
    /// The native identity key, if this reference has one.
    pub fn key(&self) -> Option<Uuid> {
        match self {
            MemberRef::Key(id) => Some(*id),
            MemberRef::Raw(_) => None,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberRef::Key(id) => write!(f, "{id}"),
            MemberRef::Raw(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionRequest {
    pub id: Uuid,
    pub member: MemberRef,
    /// Applicant-submitted target values. Each may be empty or a
    /// placeholder string; see `validation`.
    pub region: String,
    pub specialty: String,
    pub license_number: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransitionRequest {
    pub member_id: Uuid,
    pub region: String,
    pub specialty: String,
    pub license_number: String,
}
