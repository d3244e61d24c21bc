// src/services/alert_rules.rs
//
// Which alerts a staff record should have at a given instant. Pure; the sweep
// job decides what actually gets inserted.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::models::{
    alert::{AlertDraft, AlertSeverity},
    policy::Policy,
    staff::{Staff, TrainingKind},
};

const EXPIRY_WINDOW_DAYS: i64 = 7;
const POLICY_GRACE_DAYS: i64 = 7;

pub const CATEGORY_DBS: &str = "DBS";
pub const CATEGORY_TRAINING: &str = "Training";
pub const CATEGORY_COMPLIANCE: &str = "Compliance";
pub const CATEGORY_POLICY: &str = "Policy";

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn display(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn draft(staff: &Staff, title: String, description: String, severity: AlertSeverity, category: &str) -> AlertDraft {
    AlertDraft {
        staff_id: staff.id,
        title,
        description,
        severity,
        category: category.to_string(),
    }
}

fn training_alert(staff: &Staff, kind: TrainingKind, now: DateTime<Utc>) -> Option<AlertDraft> {
    let label = kind.label();
    let date = staff.training_date(kind);

    if let Some(date) = date.filter(|d| start_of(*d) < now) {
        return Some(draft(
            staff,
            format!("{label} Training Overdue"),
            format!("{} - {label} training expired on {}", staff.name, display(date)),
            AlertSeverity::Danger,
            CATEGORY_TRAINING,
        ));
    }

    if staff.training_status(kind).eq_ignore_ascii_case("pending") {
        return Some(draft(
            staff,
            format!("{label} Training Pending"),
            format!("{} - {label} training has not been completed", staff.name),
            AlertSeverity::Warning,
            CATEGORY_TRAINING,
        ));
    }

    let horizon = now + Duration::days(EXPIRY_WINDOW_DAYS);
    date.filter(|d| start_of(*d) <= horizon).map(|date| {
        draft(
            staff,
            format!("{label} Training Expiring Soon"),
            format!("{} - {label} training expires on {}", staff.name, display(date)),
            AlertSeverity::Info,
            CATEGORY_TRAINING,
        )
    })
}

fn policy_alert(staff: &Staff, policy: &Policy, now: DateTime<Utc>) -> Option<AlertDraft> {
    if policy.home_id != staff.home_id
        || !policy.is_assigned_to(staff.id)
        || policy.is_acknowledged_by(staff.id)
    {
        return None;
    }

    let stale = now - start_of(policy.last_updated) > Duration::days(POLICY_GRACE_DAYS);
    let severity = match (stale, policy.acknowledgements) {
        (false, _) => AlertSeverity::Info,
        (true, 0) => AlertSeverity::Danger,
        (true, _) => AlertSeverity::Warning,
    };

    Some(draft(
        staff,
        format!("Policy Acknowledgement Required: {}", policy.title),
        format!(
            "{} has not acknowledged {} (version {}), last updated {}",
            staff.name,
            policy.title,
            policy.version,
            display(policy.last_updated)
        ),
        severity,
        CATEGORY_POLICY,
    ))
}

/// Every alert `staff` qualifies for at `now`, given the policies of all homes.
pub fn evaluate_staff(staff: &Staff, policies: &[Policy], now: DateTime<Utc>) -> Vec<AlertDraft> {
    let mut drafts = Vec::new();

    if staff.dbs_check_status.eq_ignore_ascii_case("warning") {
        let description = match staff.dbs_expiry_date {
            Some(expiry) => format!("{} - DBS check needs attention, expiry {}", staff.name, display(expiry)),
            None => format!("{} - DBS check needs attention", staff.name),
        };
        drafts.push(draft(
            staff,
            "DBS Check Warning".to_string(),
            description,
            AlertSeverity::Warning,
            CATEGORY_DBS,
        ));
    }

    drafts.extend(
        TrainingKind::ALL
            .iter()
            .filter_map(|kind| training_alert(staff, *kind, now)),
    );

    if staff.status.eq_ignore_ascii_case("overdue") {
        drafts.push(draft(
            staff,
            "Staff Compliance Overdue".to_string(),
            format!("{} - compliance requirements are overdue", staff.name),
            AlertSeverity::Danger,
            CATEGORY_COMPLIANCE,
        ));
    } else if staff.status.eq_ignore_ascii_case("warning") {
        drafts.push(draft(
            staff,
            "Staff Compliance Warning".to_string(),
            format!("{} - compliance requirements need attention", staff.name),
            AlertSeverity::Warning,
            CATEGORY_COMPLIANCE,
        ));
    }

    drafts.extend(policies.iter().filter_map(|p| policy_alert(staff, p, now)));

    drafts
}


#[cfg(test)]
mod tests {
    use super::fixtures::{assigned, policy};
    use super::*;
    use crate::services::compliance::fixtures::{compliant, staff};
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn titles(drafts: &[AlertDraft]) -> Vec<&str> {
        drafts.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn compliant_staff_with_future_dates_raise_nothing() {
        let mut s = compliant("Ada");
        s.training_safeguarding_date = Some(date(2031, 1, 1));
        assert!(evaluate_staff(&s, &[], noon(2030, 6, 1)).is_empty());
    }

    #[test]
    fn past_training_date_is_overdue_and_danger() {
        let mut s = compliant("Ada");
        s.training_safeguarding_date = Some(date(2030, 5, 20));

        let drafts = evaluate_staff(&s, &[], noon(2030, 6, 1));
        assert_eq!(titles(&drafts), vec!["Safeguarding Training Overdue"]);
        assert_eq!(drafts[0].severity, AlertSeverity::Danger);
        assert_eq!(drafts[0].category, CATEGORY_TRAINING);
        assert_eq!(drafts[0].description, "Ada - Safeguarding training expired on 20/05/2030");
    }

    #[test]
    fn overdue_wins_over_pending() {
        let mut s = staff("Ben");
        s.training_first_aid_date = Some(date(2030, 1, 1));

        let drafts = evaluate_staff(&s, &[], noon(2030, 6, 1));
        let t = titles(&drafts);
        assert!(t.contains(&"First Aid Training Overdue"));
        assert!(!t.contains(&"First Aid Training Pending"));
        assert!(t.contains(&"Safeguarding Training Pending"));
        assert!(t.contains(&"Medication Training Pending"));
    }

    #[test]
    fn dates_within_a_week_are_expiring_soon() {
        let mut s = compliant("Cy");
        s.training_medication_date = Some(date(2030, 6, 5));
        s.training_first_aid_date = Some(date(2030, 6, 20));

        let drafts = evaluate_staff(&s, &[], noon(2030, 6, 1));
        assert_eq!(titles(&drafts), vec!["Medication Training Expiring Soon"]);
        assert_eq!(drafts[0].severity, AlertSeverity::Info);
    }

    #[test]
    fn dbs_and_staff_status_rules() {
        let mut s = compliant("Di");
        s.dbs_check_status = "Warning".into();
        s.status = "overdue".into();

        let drafts = evaluate_staff(&s, &[], noon(2030, 6, 1));
        assert_eq!(titles(&drafts), vec!["DBS Check Warning", "Staff Compliance Overdue"]);
        assert_eq!(drafts[1].severity, AlertSeverity::Danger);

        s.status = "warning".into();
        let drafts = evaluate_staff(&s, &[], noon(2030, 6, 1));
        assert_eq!(drafts[1].title, "Staff Compliance Warning");
        assert_eq!(drafts[1].severity, AlertSeverity::Warning);
    }

    #[test]
    fn policy_severity_escalates_with_age() {
        let s = compliant("Ed");
        let now = noon(2030, 6, 10);

        let fresh = assigned(policy(s.home_id, "Fire Safety", date(2030, 6, 8)), &s);
        let drafts = evaluate_staff(&s, &[fresh], now);
        assert_eq!(drafts[0].title, "Policy Acknowledgement Required: Fire Safety");
        assert_eq!(drafts[0].severity, AlertSeverity::Info);

        let stale = assigned(policy(s.home_id, "Fire Safety", date(2030, 5, 1)), &s);
        assert_eq!(evaluate_staff(&s, &[stale.clone()], now)[0].severity, AlertSeverity::Danger);

        let mut partly = stale;
        partly.acknowledged_staff.push(uuid::Uuid::new_v4());
        partly.acknowledgements = 1;
        assert_eq!(evaluate_staff(&s, &[partly], now)[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn policies_skip_acknowledged_unassigned_and_foreign_homes() {
        let s = compliant("Flo");
        let now = noon(2030, 6, 10);

        let mut acknowledged = assigned(policy(s.home_id, "A", date(2030, 1, 1)), &s);
        acknowledged.acknowledged_staff.push(s.id);
        acknowledged.acknowledgements = 1;

        let unassigned = policy(s.home_id, "B", date(2030, 1, 1));

        let mut foreign = assigned(policy(s.home_id, "C", date(2030, 1, 1)), &s);
        foreign.home_id = uuid::Uuid::new_v4();

        assert!(evaluate_staff(&s, &[acknowledged, unassigned, foreign], now).is_empty());
    }
}
