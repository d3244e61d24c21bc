// src/services/compliance.rs

use crate::models::staff::{ComplianceSummary, Staff, TrainingKind};

const DBS_VALID: &str = "valid";
const TRAINING_COMPLETE: &str = "complete";
const STATUS_WARNING: &str = "warning";
const STATUS_OVERDUE: &str = "overdue";

fn is_complete(staff: &Staff, kind: TrainingKind) -> bool {
    staff.training_status(kind).eq_ignore_ascii_case(TRAINING_COMPLETE)
}

/// Valid DBS check and all three trainings complete.
pub fn is_compliant(staff: &Staff) -> bool {
    staff.dbs_check_status.eq_ignore_ascii_case(DBS_VALID)
        && TrainingKind::ALL.iter().all(|kind| is_complete(staff, *kind))
}

pub fn completed_trainings(staff: &Staff) -> usize {
    TrainingKind::ALL
        .iter()
        .filter(|kind| is_complete(staff, **kind))
        .count()
}

/// Percentage of the mandatory trainings completed, rounded.
pub fn overall_compliance(staff: &Staff) -> u32 {
    readiness_percent(completed_trainings(staff), TrainingKind::ALL.len())
}

/// round(100 * part / total); 0 for an empty total.
pub fn readiness_percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 * 100.0) / total as f64).round() as u32
}

pub fn summarize(staff: &[Staff]) -> ComplianceSummary {
    let fully_compliant = staff.iter().filter(|s| is_compliant(s)).count();
    let attention_needed = staff
        .iter()
        .filter(|s| s.status.eq_ignore_ascii_case(STATUS_WARNING))
        .count();
    let overdue = staff
        .iter()
        .filter(|s| s.status.eq_ignore_ascii_case(STATUS_OVERDUE))
        .count();

    ComplianceSummary {
        overall_compliance: readiness_percent(fully_compliant, staff.len()),
        fully_compliant,
        attention_needed,
        overdue,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    use crate::models::staff::Staff;

    pub fn staff(name: &str) -> Staff {
        let now = Utc::now();
        Staff {
            id: Uuid::new_v4(),
            user_id: None,
            home_id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Carer".to_string(),
            status: "active".to_string(),
            dbs_check_status: "pending".to_string(),
            dbs_expiry_date: None,
            training_safeguarding_status: "pending".to_string(),
            training_safeguarding_date: None,
            training_first_aid_status: "pending".to_string(),
            training_first_aid_date: None,
            training_medication_status: "pending".to_string(),
            training_medication_date: None,
            training_certificates: Vec::new(),
            employment_history: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn compliant(name: &str) -> Staff {
        let mut s = staff(name);
        s.dbs_check_status = "valid".into();
        s.training_safeguarding_status = "complete".into();
        s.training_first_aid_status = "complete".into();
        s.training_medication_status = "complete".into();
        s
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{compliant, staff};
    use super::*;

    #[test]
    fn compliance_flips_with_a_single_training() {
        let mut s = compliant("Ada");
        assert!(is_compliant(&s));

        s.training_medication_status = "pending".into();
        assert!(!is_compliant(&s));
    }

    #[test]
    fn dbs_must_be_valid() {
        let mut s = compliant("Ada");
        s.dbs_check_status = "warning".into();
        assert!(!is_compliant(&s));
    }

    #[test]
    fn status_comparison_ignores_case() {
        let mut s = compliant("Ada");
        s.dbs_check_status = "Valid".into();
        s.training_first_aid_status = "COMPLETE".into();
        assert!(is_compliant(&s));
    }

    #[test]
    fn two_of_three_trainings_is_67_percent() {
        let mut s = staff("Ben");
        s.training_safeguarding_status = "complete".into();
        s.training_first_aid_status = "complete".into();
        assert_eq!(overall_compliance(&s), 67);
    }

    #[test]
    fn readiness_of_nothing_is_zero() {
        assert_eq!(readiness_percent(0, 0), 0);
        assert_eq!(readiness_percent(1, 3), 33);
        assert_eq!(readiness_percent(3, 3), 100);
    }

    #[test]
    fn summary_counts_statuses() {
        let mut warning = staff("Cy");
        warning.status = "warning".into();
        let mut overdue = staff("Di");
        overdue.status = "Overdue".into();

        let summary = summarize(&[compliant("Ada"), warning, overdue, staff("Ed")]);
        assert_eq!(
            summary,
            ComplianceSummary {
                overall_compliance: 25,
                fully_compliant: 1,
                attention_needed: 1,
                overdue: 1,
            }
        );
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(summarize(&[]), ComplianceSummary::default());
    }
}
