//! SurrealDB repository implementations.

mod member;
mod transition;

pub use member::SurrealMemberRepository;
pub use transition::SurrealTransitionRequestRepository;
