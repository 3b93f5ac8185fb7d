// src/handlers/payroll.rs

use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    models::{
        AssignmentId, Deduction, EditEntryRequest, EntryView, NetSalaryBreakdown,
        NetSalaryPreviewRequest, PayAllOutcome, Period, PeriodView,
    },
    services::{
        calculator::{self, SalaryInputs},
        lifecycle,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Local;

/// Payroll entries for a month, loaded from the HRMS backend on first use
#[utoipa::path(
    get,
    path = "/api/v1/payroll/periods/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12"),
    ),
    responses(
        (status = 200, description = "Payroll view for the period", body = PeriodView),
        (status = 400, description = "Invalid period"),
        (status = 403, description = "Not an HR manager"),
        (status = 502, description = "HRMS backend unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_period(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> AppResult<Json<PeriodView>> {
    auth.require_payroll_access()?;
    let period = Period::new(year, month)?;

    Ok(Json(state.engine.period_view(period).await?))
}

/// Discard local state for the month and reload it from the backend
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{year}/{month}/refresh",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12"),
    ),
    responses(
        (status = 200, description = "Freshly loaded payroll view", body = PeriodView),
        (status = 400, description = "Invalid period"),
        (status = 403, description = "Not an HR manager"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn refresh_period(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> AppResult<Json<PeriodView>> {
    auth.require_payroll_access()?;
    let period = Period::new(year, month)?;

    Ok(Json(state.engine.load_period(period).await?))
}

/// Edit and save a DRAFT payroll entry
#[utoipa::path(
    put,
    path = "/api/v1/payroll/periods/{year}/{month}/entries/{assignment_id}",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12"),
        ("assignment_id" = i64, Path, description = "Assignment ID"),
    ),
    request_body = EditEntryRequest,
    responses(
        (status = 200, description = "Entry saved", body = EntryView),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No entry for this assignment"),
        (status = 422, description = "Entry is already paid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn save_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((year, month, assignment_id)): Path<(i32, u32, AssignmentId)>,
    Json(body): Json<EditEntryRequest>,
) -> AppResult<Json<EntryView>> {
    auth.require_payroll_access()?;
    let period = Period::new(year, month)?;

    let saved = state
        .engine
        .save_entry(period, assignment_id, &body, auth.user_id)
        .await?;
    Ok(Json(saved))
}

/// Persist an entry and mark it paid
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{year}/{month}/entries/{assignment_id}/pay",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12"),
        ("assignment_id" = i64, Path, description = "Assignment ID"),
    ),
    responses(
        (status = 200, description = "Entry paid", body = EntryView),
        (status = 404, description = "No entry for this assignment"),
        (status = 422, description = "Entry is already paid"),
        (status = 502, description = "Saved, but the payment call failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn pay_entry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((year, month, assignment_id)): Path<(i32, u32, AssignmentId)>,
) -> AppResult<Json<EntryView>> {
    auth.require_payroll_access()?;
    let period = Period::new(year, month)?;

    let paid = state
        .engine
        .pay_entry(period, assignment_id, auth.user_id)
        .await?;
    Ok(Json(paid))
}

/// Persist and pay every unpaid entry of the month
#[utoipa::path(
    post,
    path = "/api/v1/payroll/periods/{year}/{month}/pay-all",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12"),
    ),
    responses(
        (status = 200, description = "Unpaid entries marked paid", body = PayAllOutcome),
        (status = 422, description = "Every entry is already paid"),
        (status = 502, description = "Saved, but the payment call failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn pay_all(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> AppResult<Json<PayAllOutcome>> {
    auth.require_payroll_access()?;
    let period = Period::new(year, month)?;

    Ok(Json(state.engine.pay_all(period, auth.user_id).await?))
}

/// Net salary of a draft form, computed exactly as it will be on save
#[utoipa::path(
    post,
    path = "/api/v1/payroll/net-salary/preview",
    request_body = NetSalaryPreviewRequest,
    responses(
        (status = 200, description = "Net salary breakdown", body = NetSalaryBreakdown),
        (status = 400, description = "Invalid period or amounts too large"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_net_salary(
    auth: AuthUser,
    Json(body): Json<NetSalaryPreviewRequest>,
) -> AppResult<Json<NetSalaryBreakdown>> {
    auth.require_payroll_access()?;
    let period = Period::new(body.year, body.month)?;

    let today = Local::now().date_naive();
    let deductions: Vec<Deduction> = body
        .deductions
        .iter()
        .map(|d| lifecycle::resolve_deduction(d, &[], today))
        .collect();

    let breakdown = calculator::breakdown(
        SalaryInputs {
            gross_salary: body.gross_salary,
            bonus_amount: body.bonus_amount,
            hour_variance: body.hour_variance,
            deductions: &deductions,
        },
        period,
    )
    .ok_or_else(|| {
        AppError::Validation("Amounts are too large to compute a net salary".to_string())
    })?;
    Ok(Json(breakdown))
}
