//! Completeness checks for submitted transition credentials.
//!
//! Pure and total over string inputs: no I/O and no error conditions.
//! A field is "incomplete" when it is blank or holds a placeholder the
//! application form lets through.

use serde::{Deserialize, Serialize};

use crate::models::transition::TransitionRequest;

/// Placeholder strings treated as "not yet provided" for license
/// numbers. Compared case-insensitively after trimming.
const LICENSE_SENTINELS: &[&str] = &["awaiting", "n/a", "pending", "nil", "none"];

/// Specialty sentinels. "n/a" is deliberately absent: production data
/// treats "N/A" as a real specialty answer. Kept as a separate constant
/// so the two lists can be collapsed in one place if product decides
/// the asymmetry is unintended.
const SPECIALTY_SENTINELS: &[&str] = &["awaiting", "pending", "nil", "none"];

fn is_sentinel(value: &str, sentinels: &[&str]) -> bool {
    let v = value.trim().to_lowercase();
    v.is_empty() || sentinels.contains(&v.as_str())
}

pub fn is_valid_license(value: &str) -> bool {
    !is_sentinel(value, LICENSE_SENTINELS)
}

pub fn is_valid_specialty(value: &str) -> bool {
    !is_sentinel(value, SPECIALTY_SENTINELS)
}

pub fn is_valid_region(value: &str) -> bool {
    !value.trim().is_empty()
}

/// A field of a transition request that failed completeness checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidField {
    License,
    Specialty,
    Region,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestValidity {
    pub valid: bool,
    pub reasons: Vec<InvalidField>,
}

/// Classify a whole request. Valid iff all three field checks pass;
/// `reasons` enumerates the failing fields for diagnostic reporting.
pub fn classify(request: &TransitionRequest) -> RequestValidity {
    let mut reasons = Vec::new();
    if !is_valid_license(&request.license_number) {
        reasons.push(InvalidField::License);
    }
    if !is_valid_specialty(&request.specialty) {
        reasons.push(InvalidField::Specialty);
    }
    if !is_valid_region(&request.region) {
        reasons.push(InvalidField::Region);
    }
    RequestValidity {
        valid: reasons.is_empty(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::transition::{MemberRef, RequestStatus};

    fn request(region: &str, specialty: &str, license: &str) -> TransitionRequest {
        TransitionRequest {
            id: Uuid::new_v4(),
            member: MemberRef::Key(Uuid::new_v4()),
            region: region.into(),
            specialty: specialty.into(),
            license_number: license.into(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn license_sentinels_are_case_insensitive() {
        assert!(!is_valid_license("AWAITING"));
        assert!(!is_valid_license("  awaiting  "));
        assert!(!is_valid_license("N/A"));
        assert!(!is_valid_license("Pending"));
        assert!(!is_valid_license("nil"));
        assert!(!is_valid_license("None"));
        assert!(!is_valid_license(""));
        assert!(!is_valid_license("   "));
        assert!(is_valid_license("MDCN/2019/44871"));
    }

    #[test]
    fn specialty_sentinel_list_omits_n_a() {
        assert!(!is_valid_specialty("Awaiting"));
        assert!(!is_valid_specialty(""));
        assert!(is_valid_specialty("N/A"));
        assert!(is_valid_specialty("Paediatrics"));
    }

    #[test]
    fn region_requires_non_blank() {
        assert!(is_valid_region("Kogi"));
        assert!(!is_valid_region(""));
        assert!(!is_valid_region("  "));
    }

    #[test]
    fn classify_enumerates_failing_fields() {
        let v = classify(&request("Kogi", "Surgery", "MDCN/1"));
        assert!(v.valid);
        assert!(v.reasons.is_empty());

        let v = classify(&request("", "Awaiting", "n/a"));
        assert!(!v.valid);
        assert_eq!(
            v.reasons,
            vec![
                InvalidField::License,
                InvalidField::Specialty,
                InvalidField::Region
            ]
        );

        let v = classify(&request("Kogi", "Surgery", ""));
        assert_eq!(v.reasons, vec![InvalidField::License]);
    }
}
