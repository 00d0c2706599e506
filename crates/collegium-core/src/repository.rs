//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Store handles are constructor-
//! injected into the engine; this subsystem owns no global connection
//! state.

use uuid::Uuid;

use crate::error::CollegiumResult;
use crate::models::member::{CreateMember, Member, TransitionFields, UpdateMember};
use crate::models::transition::{CreateTransitionRequest, RequestStatus, TransitionRequest};

pub trait MemberRepository: Send + Sync {
    fn create(&self, input: CreateMember) -> impl Future<Output = CollegiumResult<Member>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CollegiumResult<Member>> + Send;
    /// Partial field update. `Option<Option<_>>` fields clear on
    /// `Some(None)`.
    fn update_fields(
        &self,
        id: Uuid,
        input: UpdateMember,
    ) -> impl Future<Output = CollegiumResult<Member>> + Send;
}

pub trait TransitionRequestRepository: Send + Sync {
    /// Create a pending request. Rejects a second pending request for
    /// the same member with `AlreadyExists`.
    fn create(
        &self,
        input: CreateTransitionRequest,
    ) -> impl Future<Output = CollegiumResult<TransitionRequest>> + Send;

    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = CollegiumResult<TransitionRequest>> + Send;

    /// All requests in the given state, ordered by creation time.
    fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> impl Future<Output = CollegiumResult<Vec<TransitionRequest>>> + Send;

    /// Every request regardless of state (reconciliation scan).
    fn find_all(&self) -> impl Future<Output = CollegiumResult<Vec<TransitionRequest>>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = CollegiumResult<()>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> impl Future<Output = CollegiumResult<()>> + Send;

    /// Rewrite a legacy string member reference to the native record
    /// link. Used by reconciliation only.
    fn relink_member(
        &self,
        request_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = CollegiumResult<()>> + Send;

    /// Apply the transition field set to the member and delete the
    /// request in a single store transaction. Returns the updated
    /// member.
    fn approve(
        &self,
        request_id: Uuid,
        member_id: Uuid,
        fields: TransitionFields,
    ) -> impl Future<Output = CollegiumResult<Member>> + Send;
}
