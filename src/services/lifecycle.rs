// src/services/lifecycle.rs
//
// DRAFT → PAID lifecycle of a single payroll entry. Nothing here performs
// I/O; the engine in `payroll.rs` sequences these steps around backend calls.

use crate::{
    errors::{AppError, AppResult},
    models::{
        Deduction, DeductionInput, DeductionPayload, DeductionType, EditEntryRequest,
        EntryPayload, PayrollEntry, PayrollRow, Period, RunStatus,
    },
    services::calculator::{self, SalaryInputs},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const FALLBACK_DEDUCTION_TYPE_ID: i64 = 1;

/// Fills in the gaps of a raw deduction: type id defaults to the first known
/// deduction type, the name is looked up, the date defaults to `today`.
pub fn resolve_deduction(
    input: &DeductionInput,
    types: &[DeductionType],
    today: NaiveDate,
) -> Deduction {
    let deduction_type_id = input.deduction_type_id.unwrap_or_else(|| {
        types
            .first()
            .map(|t| t.deduction_type_id)
            .unwrap_or(FALLBACK_DEDUCTION_TYPE_ID)
    });

    let deduction_type_name = types
        .iter()
        .find(|t| t.deduction_type_id == deduction_type_id)
        .map(|t| t.name.clone())
        .or_else(|| input.deduction_type_name.clone())
        .unwrap_or_default();

    Deduction {
        deduction_type_id,
        deduction_type_name,
        amount: input.amount,
        reason: input.reason.clone().unwrap_or_default(),
        effective_date: input.effective_date.unwrap_or(today),
    }
}

fn salary_inputs(entry: &PayrollEntry) -> SalaryInputs<'_> {
    SalaryInputs {
        gross_salary: entry.gross_salary,
        bonus_amount: entry.bonus_amount,
        hour_variance: entry.hour_variance,
        deductions: &entry.deductions,
    }
}

/// Net salary derived from the entry's own fields; `None` on overflow.
fn computed_net_salary(entry: &PayrollEntry) -> Option<Decimal> {
    calculator::net_salary(salary_inputs(entry), entry.period)
}

/// Builds the engine's view of a backend row. The backend's own net salary
/// is ignored and recomputed.
pub fn entry_from_row(
    row: PayrollRow,
    period: Period,
    types: &[DeductionType],
    today: NaiveDate,
) -> AppResult<PayrollEntry> {
    let deductions = row
        .deductions
        .iter()
        .map(|d| resolve_deduction(d, types, today))
        .collect();

    let mut entry = PayrollEntry {
        employee_id: row.employee_id,
        employee_name: row.employee_name.unwrap_or_default(),
        assignment_id: row.assignment_id,
        payroll_entry_id: row.payroll_entry_id,
        period,
        gross_salary: row.gross_salary,
        bonus_amount: row.bonus_amount,
        hour_variance: row.hour_variance,
        deductions,
        net_salary: Decimal::ZERO,
        run_status: RunStatus::normalize(row.run_status.as_deref()),
        pay_date: row.pay_date,
        remarks: row.remarks,
    };
    entry.net_salary = computed_net_salary(&entry).ok_or_else(|| AppError::Backend {
        status: None,
        message: format!(
            "Payroll row for assignment {} has amounts too large to compute a net salary",
            entry.assignment_id
        ),
    })?;
    Ok(entry)
}

/// Paid entries are frozen: no edits, no second payment.
pub fn ensure_draft(entry: &PayrollEntry) -> AppResult<()> {
    if entry.is_paid() {
        return Err(AppError::AlreadyPaid {
            assignment_id: entry.assignment_id,
        });
    }
    Ok(())
}

/// DRAFT --edit--> DRAFT. Validates the form and returns the edited entry;
/// the original is left untouched until the backend accepts the change.
pub fn apply_edit(
    entry: &PayrollEntry,
    edit: &EditEntryRequest,
    types: &[DeductionType],
    today: NaiveDate,
) -> AppResult<PayrollEntry> {
    ensure_draft(entry)?;

    let gross_salary = edit.gross_salary.ok_or_else(|| {
        AppError::Validation("Gross salary is required and must be a number".to_string())
    })?;
    if gross_salary < Decimal::ZERO {
        return Err(AppError::Validation(
            "Gross salary cannot be negative".to_string(),
        ));
    }
    if edit.bonus_amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "Bonus amount cannot be negative".to_string(),
        ));
    }

    let mut edited = entry.clone();
    edited.gross_salary = gross_salary;
    edited.bonus_amount = edit.bonus_amount;
    edited.hour_variance = edit.hour_variance;
    edited.deductions = edit
        .deductions
        .iter()
        .map(|d| resolve_deduction(d, types, today))
        .collect();
    edited.remarks = edit.remarks.clone().filter(|r| !r.trim().is_empty());
    edited.net_salary = computed_net_salary(&edited).ok_or_else(|| {
        AppError::Validation("Amounts are too large to compute a net salary".to_string())
    })?;
    Ok(edited)
}

/// DRAFT --pay--> PAID, applied only after the backend confirmed payment.
pub fn mark_paid(entry: &mut PayrollEntry, pay_date: NaiveDate) {
    entry.run_status = RunStatus::Paid;
    entry.pay_date = Some(pay_date);
}

/// The upsert shape of an entry. Non-positive deductions never leave the
/// engine. The entry's net salary already ignores them.
pub fn to_payload(entry: &PayrollEntry) -> EntryPayload {
    let deductions = entry
        .deductions
        .iter()
        .filter(|d| d.is_persistable())
        .map(|d| DeductionPayload {
            deduction_type_id: d.deduction_type_id,
            amount: d.amount,
            reason: d.reason.clone(),
            effective_date: d.effective_date,
        })
        .collect();

    EntryPayload {
        assignment_id: entry.assignment_id,
        gross_salary: entry.gross_salary,
        bonus_amount: entry.bonus_amount,
        hour_variance: entry.hour_variance,
        net_salary: entry.net_salary,
        remarks: entry.remarks.clone(),
        payroll_entry_id: entry.payroll_entry_id,
        deductions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    fn types() -> Vec<DeductionType> {
        vec![
            DeductionType {
                deduction_type_id: 4,
                name: "Loan repayment".to_string(),
            },
            DeductionType {
                deduction_type_id: 9,
                name: "Uniform".to_string(),
            },
        ]
    }

    fn draft_entry() -> PayrollEntry {
        let row = PayrollRow {
            employee_id: 3,
            employee_name: Some("Grace Hopper".to_string()),
            assignment_id: 30,
            payroll_entry_id: Some(300),
            gross_salary: dec!(5000),
            bonus_amount: dec!(200),
            hour_variance: dec!(-2),
            deductions: vec![DeductionInput {
                deduction_type_id: Some(4),
                amount: dec!(150),
                ..Default::default()
            }],
            run_status: Some("draft".to_string()),
            pay_date: None,
            remarks: None,
        };
        entry_from_row(row, Period::new(2024, 6).unwrap(), &types(), today()).unwrap()
    }

    #[test]
    fn entry_from_row_derives_net_salary() {
        let entry = draft_entry();
        assert_eq!(entry.net_salary, dec!(4987.5));
        assert_eq!(entry.run_status, RunStatus::Draft);
        assert_eq!(entry.deductions[0].deduction_type_name, "Loan repayment");
        assert_eq!(entry.deductions[0].effective_date, today());
    }

    #[test]
    fn missing_deduction_type_defaults_to_first_known_type() {
        let resolved = resolve_deduction(&DeductionInput::default(), &types(), today());
        assert_eq!(resolved.deduction_type_id, 4);
        assert_eq!(resolved.deduction_type_name, "Loan repayment");

        let resolved = resolve_deduction(&DeductionInput::default(), &[], today());
        assert_eq!(resolved.deduction_type_id, FALLBACK_DEDUCTION_TYPE_ID);
        assert_eq!(resolved.deduction_type_name, "");
    }

    #[test]
    fn edit_requires_gross_salary() {
        let entry = draft_entry();
        let edit = EditEntryRequest {
            gross_salary: None,
            ..Default::default()
        };
        let err = apply_edit(&entry, &edit, &types(), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let edit = EditEntryRequest {
            gross_salary: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(apply_edit(&entry, &edit, &types(), today()).is_err());
    }

    #[test]
    fn edit_recomputes_net_and_keeps_status() {
        let entry = draft_entry();
        let edit = EditEntryRequest {
            gross_salary: Some(dec!(4000)),
            bonus_amount: dec!(0),
            hour_variance: dec!(0),
            deductions: vec![DeductionInput {
                deduction_type_id: Some(9),
                amount: dec!(100),
                reason: Some("Boots".to_string()),
                ..Default::default()
            }],
            remarks: Some("  ".to_string()),
        };

        let edited = apply_edit(&entry, &edit, &types(), today()).unwrap();
        assert_eq!(edited.net_salary, dec!(3900));
        assert_eq!(edited.run_status, RunStatus::Draft);
        assert_eq!(edited.deductions[0].deduction_type_name, "Uniform");
        assert_eq!(edited.remarks, None);
        // the source entry is untouched
        assert_eq!(entry.gross_salary, dec!(5000));
    }

    #[test]
    fn paid_entries_reject_edits() {
        let mut entry = draft_entry();
        mark_paid(&mut entry, today());
        let edit = EditEntryRequest {
            gross_salary: Some(dec!(1)),
            ..Default::default()
        };
        let err = apply_edit(&entry, &edit, &types(), today()).unwrap_err();
        assert!(matches!(err, AppError::AlreadyPaid { assignment_id: 30 }));
        assert!(ensure_draft(&entry).is_err());
    }

    #[test]
    fn payload_drops_non_positive_deductions() {
        let mut entry = draft_entry();
        entry.deductions.push(resolve_deduction(
            &DeductionInput {
                amount: Decimal::ZERO,
                ..Default::default()
            },
            &types(),
            today(),
        ));
        entry.deductions.push(resolve_deduction(
            &DeductionInput {
                amount: dec!(-25),
                ..Default::default()
            },
            &types(),
            today(),
        ));

        let payload = to_payload(&entry);
        assert_eq!(payload.deductions.len(), 1);
        assert_eq!(payload.deductions[0].amount, dec!(150));
        assert_eq!(payload.net_salary, dec!(4987.5));
        assert_eq!(payload.payroll_entry_id, Some(300));
        // the local entry still holds all three
        assert_eq!(entry.deductions.len(), 3);
    }

    #[test]
    fn oversized_backend_row_is_a_backend_error() {
        let row = PayrollRow {
            employee_id: 4,
            employee_name: None,
            assignment_id: 40,
            payroll_entry_id: None,
            gross_salary: dec!(50000000000000000000000000000),
            bonus_amount: dec!(50000000000000000000000000000),
            hour_variance: Decimal::ZERO,
            deductions: Vec::new(),
            run_status: None,
            pay_date: None,
            remarks: None,
        };
        let err = entry_from_row(row, Period::new(2024, 6).unwrap(), &types(), today()).unwrap_err();
        assert!(matches!(err, AppError::Backend { status: None, .. }));
    }

    #[test]
    fn oversized_edit_is_a_validation_error() {
        let entry = draft_entry();
        let edit = EditEntryRequest {
            gross_salary: Some(dec!(10000000000)),
            hour_variance: dec!(-10000000000000000000000000),
            ..Default::default()
        };
        let err = apply_edit(&entry, &edit, &types(), today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
