// src/models/mod.rs

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod lenient;

pub type AssignmentId = i64;

// ─── Period ───────────────────────────────────────────────────────────────────

/// A payroll month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct Period {
    pub year: i32,
    /// 1 = January … 12 = December
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(1900..=9999).contains(&year) {
            return Err(AppError::Validation(format!(
                "Year must be between 1900 and 9999, got {}",
                year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month;
        self.first_day()
            .iter_days()
            .take_while(move |day| day.month() == month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ─── Run Status ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Draft,
    Paid,
}

impl RunStatus {
    /// Maps whatever the backend reports onto the two lifecycle states.
    /// `APPROVED` and `PROCESSED` are synonyms for `PAID`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()).as_deref() {
            Some("PAID" | "APPROVED" | "PROCESSED") => RunStatus::Paid,
            _ => RunStatus::Draft,
        }
    }

    pub fn is_paid(self) -> bool {
        self == RunStatus::Paid
    }
}

// ─── Deductions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeductionType {
    #[serde(deserialize_with = "lenient::id")]
    pub deduction_type_id: i64,
    #[serde(default)]
    pub name: String,
}

/// A deduction as it arrives from the backend or from an edit form.
/// Every field is optional; the engine resolves the gaps.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeductionInput {
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub deduction_type_id: Option<i64>,
    #[serde(default)]
    pub deduction_type_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Deduction {
    pub deduction_type_id: i64,
    pub deduction_type_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reason: String,
    pub effective_date: NaiveDate,
}

impl Deduction {
    /// Only strictly positive deductions are ever sent to the backend
    pub fn is_persistable(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

// ─── Payroll Rows (backend wire format) ───────────────────────────────────────

/// One row of `GET /payroll/employees`.
#[derive(Debug, Clone, Deserialize)]
pub struct PayrollRow {
    #[serde(deserialize_with = "lenient::id")]
    pub employee_id: i64,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(deserialize_with = "lenient::id")]
    pub assignment_id: AssignmentId,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub payroll_entry_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub gross_salary: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub bonus_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub hour_variance: Decimal,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub deductions: Vec<DeductionInput>,
    #[serde(default)]
    pub run_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub pay_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: Option<String>,
}

// ─── Payroll Entry (engine state) ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollEntry {
    pub employee_id: i64,
    pub employee_name: String,
    pub assignment_id: AssignmentId,
    pub payroll_entry_id: Option<i64>,
    pub period: Period,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_salary: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bonus_amount: Decimal,
    /// Signed hours; negative means the employee worked less than expected
    #[serde(with = "rust_decimal::serde::float")]
    pub hour_variance: Decimal,
    pub deductions: Vec<Deduction>,
    /// Always derived from the other fields, never taken from the backend
    #[serde(with = "rust_decimal::serde::float")]
    pub net_salary: Decimal,
    pub run_status: RunStatus,
    pub pay_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

impl PayrollEntry {
    pub fn is_paid(&self) -> bool {
        self.run_status.is_paid()
    }
}

// ─── Backend Requests / Responses ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionPayload {
    pub deduction_type_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub reason: String,
    pub effective_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPayload {
    pub assignment_id: AssignmentId,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_salary: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bonus_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hour_variance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_salary: Decimal,
    pub remarks: Option<String>,
    pub payroll_entry_id: Option<i64>,
    pub deductions: Vec<DeductionPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpsertRequest {
    pub month: u32,
    pub year: i32,
    pub entries: Vec<EntryPayload>,
    pub created_by_user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayIndividualRequest {
    pub month: u32,
    pub year: i32,
    pub assignment_id: AssignmentId,
    pub employee_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayIndividualResponse {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub pay_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayAllRequest {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayAllResponse {
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub pay_date: Option<NaiveDate>,
}

// ─── API Requests ─────────────────────────────────────────────────────────────

/// Edit-and-save form for a DRAFT entry
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EditEntryRequest {
    /// Required; a missing or non-numeric value is rejected
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    #[schema(value_type = Option<f64>)]
    pub gross_salary: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[schema(value_type = f64)]
    pub bonus_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[schema(value_type = f64)]
    pub hour_variance: Decimal,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub deductions: Vec<DeductionInput>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NetSalaryPreviewRequest {
    pub year: i32,
    pub month: u32,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[schema(value_type = f64)]
    pub gross_salary: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[schema(value_type = f64)]
    pub bonus_amount: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[schema(value_type = f64)]
    pub hour_variance: Decimal,
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub deductions: Vec<DeductionInput>,
}

// ─── API Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NetSalaryBreakdown {
    pub weekday_count: u32,
    pub expected_hours: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub hourly_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub hour_variance_deduction: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_deductions: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_salary: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: PayrollEntry,
    /// False once the entry is paid
    pub editable: bool,
}

impl From<PayrollEntry> for EntryView {
    fn from(entry: PayrollEntry) -> Self {
        let editable = !entry.is_paid();
        EntryView { entry, editable }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeriodTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_net_salary: Decimal,
    pub paid_count: usize,
    pub draft_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeriodView {
    pub period: Period,
    pub entries: Vec<EntryView>,
    pub deduction_types: Vec<DeductionType>,
    pub totals: PeriodTotals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayAllOutcome {
    pub period: Period,
    pub paid_count: usize,
    pub pay_date: NaiveDate,
    pub entries: Vec<EntryView>,
}

// ─── JWT Claims ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Owner,
    HrManager,
    HrAssistant,
    Manager,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric HRMS user id
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}
