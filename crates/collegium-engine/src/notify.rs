//! Outcome notification seam.
//!
//! Delivery (email, push) lives behind [`Notifier`]; the engine fires
//! one notice per outcome and does not track delivery.

use collegium_core::models::member::Role;
use uuid::Uuid;

/// What happened to one transition request.
#[derive(Debug, Clone)]
pub enum TransitionNotice {
    Approved {
        request_id: Uuid,
        member_id: Uuid,
        display_name: String,
        previous_role: Role,
        new_role: Role,
    },
    MemberNotFound {
        request_id: Uuid,
        reference: String,
    },
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: TransitionNotice) -> impl Future<Output = ()> + Send;
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify(&self, _notice: TransitionNotice) {}
}
