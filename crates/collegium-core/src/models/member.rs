//! Member domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership tier. Determines which fields are semantically active on
/// a [`Member`] record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Student,
    Doctor,
    GlobalNetwork,
}

impl Role {
    /// The role a member is promoted to. Only two edges exist:
    /// Student → Doctor, everything else → GlobalNetwork. There is no
    /// downgrade path.
    pub fn transition_target(self) -> Role {
        match self {
            Role::Student => Role::Doctor,
            Role::Doctor | Role::GlobalNetwork => Role::GlobalNetwork,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Doctor => "Doctor",
            Role::GlobalNetwork => "GlobalNetwork",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    /// Chapter name for students, geographic region otherwise.
    pub region: String,
    /// Meaningful for Doctor/GlobalNetwork only.
    pub specialty: Option<String>,
    /// Meaningful for Doctor/GlobalNetwork only.
    pub license_number: Option<String>,
    /// Student-only. Must be cleared on transition away from Student.
    pub admission_year: Option<i32>,
    /// Student-only. Must be cleared on transition away from Student.
    pub year_of_study: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub region: String,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub admission_year: Option<i32>,
    pub year_of_study: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMember {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub region: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub specialty: Option<Option<String>>,
    pub license_number: Option<Option<String>>,
    pub admission_year: Option<Option<i32>>,
    pub year_of_study: Option<Option<u32>>,
}

/// The full field set applied to a member when a transition request is
/// approved. Values are already resolved: blank submissions have been
/// replaced with the placeholder, so no field is ever left absent after
/// a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFields {
    pub role: Role,
    pub region: String,
    pub specialty: String,
    pub license_number: String,
    /// True when the source role was Student: `admission_year` and
    /// `year_of_study` are cleared in the same write.
    pub clear_student_fields: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_two_transition_edges_exist() {
        assert_eq!(Role::Student.transition_target(), Role::Doctor);
        assert_eq!(Role::Doctor.transition_target(), Role::GlobalNetwork);
        assert_eq!(Role::GlobalNetwork.transition_target(), Role::GlobalNetwork);
    }
}
