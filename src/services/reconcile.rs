// src/services/reconcile.rs
//
// Read-after-write workaround: right after a payment the backend's list
// endpoint can still report the entry as DRAFT. A re-fetch that follows a
// local payment therefore keeps the locally confirmed PAID status and pay
// date; every other field is taken from the server. Fresh loads do not go
// through here.

use crate::models::{AssignmentId, PayrollEntry};
use std::collections::BTreeMap;

pub fn merge_preserving_paid(
    previous: &BTreeMap<AssignmentId, PayrollEntry>,
    fresh: Vec<PayrollEntry>,
) -> BTreeMap<AssignmentId, PayrollEntry> {
    fresh
        .into_iter()
        .map(|mut entry| {
            if let Some(local) = previous.get(&entry.assignment_id).filter(|e| e.is_paid()) {
                entry.run_status = local.run_status;
                entry.pay_date = local.pay_date;
            }
            (entry.assignment_id, entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Period, RunStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn entry(assignment_id: AssignmentId, status: RunStatus, pay_date: Option<NaiveDate>) -> PayrollEntry {
        PayrollEntry {
            employee_id: assignment_id * 10,
            employee_name: format!("Employee {}", assignment_id),
            assignment_id,
            payroll_entry_id: None,
            period: Period::new(2024, 6).unwrap(),
            gross_salary: dec!(3000),
            bonus_amount: Decimal::ZERO,
            hour_variance: Decimal::ZERO,
            deductions: vec![],
            net_salary: dec!(3000),
            run_status: status,
            pay_date,
            remarks: None,
        }
    }

    fn by_id(entries: Vec<PayrollEntry>) -> BTreeMap<AssignmentId, PayrollEntry> {
        entries.into_iter().map(|e| (e.assignment_id, e)).collect()
    }

    #[test]
    fn stale_draft_does_not_regress_local_paid() {
        let paid_on = NaiveDate::from_ymd_opt(2024, 6, 28);
        let previous = by_id(vec![entry(1, RunStatus::Paid, paid_on)]);

        let mut stale = entry(1, RunStatus::Draft, None);
        stale.gross_salary = dec!(3100);
        let merged = merge_preserving_paid(&previous, vec![stale]);

        let kept = &merged[&1];
        assert_eq!(kept.run_status, RunStatus::Paid);
        assert_eq!(kept.pay_date, paid_on);
        // non-status fields come from the server
        assert_eq!(kept.gross_salary, dec!(3100));
    }

    #[test]
    fn server_wins_for_local_drafts() {
        let server_paid_on = NaiveDate::from_ymd_opt(2024, 6, 30);
        let previous = by_id(vec![entry(1, RunStatus::Draft, None)]);
        let merged = merge_preserving_paid(&previous, vec![entry(1, RunStatus::Paid, server_paid_on)]);

        assert_eq!(merged[&1].run_status, RunStatus::Paid);
        assert_eq!(merged[&1].pay_date, server_paid_on);
    }

    #[test]
    fn local_pay_date_overrides_server_pay_date() {
        let local = NaiveDate::from_ymd_opt(2024, 6, 28);
        let server = NaiveDate::from_ymd_opt(2024, 6, 29);
        let previous = by_id(vec![entry(1, RunStatus::Paid, local)]);
        let merged = merge_preserving_paid(&previous, vec![entry(1, RunStatus::Paid, server)]);

        assert_eq!(merged[&1].pay_date, local);
    }

    #[test]
    fn membership_follows_the_server() {
        let previous = by_id(vec![
            entry(1, RunStatus::Paid, NaiveDate::from_ymd_opt(2024, 6, 28)),
            entry(2, RunStatus::Draft, None),
        ]);
        let merged = merge_preserving_paid(
            &previous,
            vec![entry(2, RunStatus::Draft, None), entry(3, RunStatus::Draft, None)],
        );

        assert_eq!(merged.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert!(merged.values().all(|e| e.run_status == RunStatus::Draft));
    }
}
