// src/testing.rs
//
// In-memory HRMS backend and fixtures shared by the unit tests.

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::{
        AssignmentId, BulkUpsertRequest, Claims, DeductionInput, DeductionType, PayAllResponse,
        PayIndividualRequest, PayIndividualResponse, PayrollRow, Period, Role, RunStatus,
    },
    services::{backend::PayrollBackend, payroll::PayrollEngine},
    state::AppState,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchRows,
    FetchTypes,
    Upsert,
    PayIndividual(AssignmentId),
    PayAll,
}

#[derive(Debug)]
pub struct FakeState {
    pub rows: Vec<PayrollRow>,
    pub deduction_types: Vec<DeductionType>,
    pub calls: Vec<Call>,
    pub upserts: Vec<BulkUpsertRequest>,
    /// Pay date the backend reports; `None` makes the engine use today
    pub pay_date: Option<NaiveDate>,
    /// Writes are accepted but never show up in later reads
    pub stale_reads: bool,
    pub fail_rows: bool,
    pub fail_deduction_types: bool,
    pub fail_upsert: bool,
    pub fail_pay: bool,
    /// Time pay-individual takes before answering
    pub pay_delay: Option<Duration>,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn with_rows(rows: Vec<PayrollRow>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                rows,
                deduction_types: vec![
                    DeductionType {
                        deduction_type_id: 1,
                        name: "Loan".to_string(),
                    },
                    DeductionType {
                        deduction_type_id: 2,
                        name: "Tax".to_string(),
                    },
                ],
                calls: Vec::new(),
                upserts: Vec::new(),
                pay_date: None,
                stale_reads: false,
                fail_rows: false,
                fail_deduction_types: false,
                fail_upsert: false,
                fail_pay: false,
                pay_delay: None,
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn last_upsert(&self) -> Option<BulkUpsertRequest> {
        self.state().upserts.last().cloned()
    }
}

fn server_error(status: u16, message: &str) -> AppError {
    AppError::Backend {
        status: Some(status),
        message: message.to_string(),
    }
}

fn is_paid(row: &PayrollRow) -> bool {
    RunStatus::normalize(row.run_status.as_deref()).is_paid()
}

#[async_trait]
impl PayrollBackend for FakeBackend {
    async fn fetch_period_rows(&self, _period: Period) -> AppResult<Vec<PayrollRow>> {
        let mut state = self.state();
        state.calls.push(Call::FetchRows);
        if state.fail_rows {
            return Err(server_error(500, "Database unavailable"));
        }
        Ok(state.rows.clone())
    }

    async fn fetch_deduction_types(&self) -> AppResult<Vec<DeductionType>> {
        let mut state = self.state();
        state.calls.push(Call::FetchTypes);
        if state.fail_deduction_types {
            return Err(server_error(503, "Service unavailable"));
        }
        Ok(state.deduction_types.clone())
    }

    async fn upsert_entries(&self, request: &BulkUpsertRequest) -> AppResult<()> {
        let mut state = self.state();
        state.calls.push(Call::Upsert);
        if state.fail_upsert {
            return Err(server_error(400, "Invalid payroll entry"));
        }
        state.upserts.push(request.clone());
        if state.stale_reads {
            return Ok(());
        }

        for payload in &request.entries {
            if let Some(row) = state
                .rows
                .iter_mut()
                .find(|r| r.assignment_id == payload.assignment_id)
            {
                row.gross_salary = payload.gross_salary;
                row.bonus_amount = payload.bonus_amount;
                row.hour_variance = payload.hour_variance;
                row.remarks = payload.remarks.clone();
                row.payroll_entry_id = payload
                    .payroll_entry_id
                    .or(Some(1000 + payload.assignment_id));
                row.deductions = payload
                    .deductions
                    .iter()
                    .map(|d| DeductionInput {
                        deduction_type_id: Some(d.deduction_type_id),
                        deduction_type_name: None,
                        amount: d.amount,
                        reason: Some(d.reason.clone()),
                        effective_date: Some(d.effective_date),
                    })
                    .collect();
            }
        }
        Ok(())
    }

    async fn pay_individual(
        &self,
        request: &PayIndividualRequest,
    ) -> AppResult<PayIndividualResponse> {
        let delay = {
            let mut state = self.state();
            state.calls.push(Call::PayIndividual(request.assignment_id));
            if state.fail_pay {
                return Err(server_error(500, "Payment gateway unavailable"));
            }
            state.pay_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let pay_date = state.pay_date;
        if !state.stale_reads {
            if let Some(row) = state
                .rows
                .iter_mut()
                .find(|r| r.assignment_id == request.assignment_id)
            {
                row.run_status = Some("PAID".to_string());
                row.pay_date = pay_date;
            }
        }
        Ok(PayIndividualResponse {
            pay_date,
            status: Some("PAID".to_string()),
        })
    }

    async fn pay_all(&self, _period: Period) -> AppResult<PayAllResponse> {
        let mut state = self.state();
        state.calls.push(Call::PayAll);
        if state.fail_pay {
            return Err(server_error(500, "Payment gateway unavailable"));
        }

        let pay_date = state.pay_date;
        if !state.stale_reads {
            for row in state.rows.iter_mut().filter(|r| !is_paid(r)) {
                row.run_status = Some("PAID".to_string());
                row.pay_date = pay_date;
            }
        }
        Ok(PayAllResponse { pay_date })
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn row(assignment_id: AssignmentId, gross_salary: Decimal) -> PayrollRow {
    PayrollRow {
        employee_id: assignment_id + 100,
        employee_name: Some(format!("Employee {}", assignment_id)),
        assignment_id,
        payroll_entry_id: None,
        gross_salary,
        bonus_amount: Decimal::ZERO,
        hour_variance: Decimal::ZERO,
        deductions: Vec::new(),
        run_status: Some("DRAFT".to_string()),
        pay_date: None,
        remarks: None,
    }
}

pub fn deduction(amount: Decimal) -> DeductionInput {
    DeductionInput {
        deduction_type_id: Some(1),
        amount,
        reason: Some("Advance".to_string()),
        ..Default::default()
    }
}

pub fn config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        hrms_api_url: "http://hrms.test/api".to_string(),
        hrms_timeout_secs: 5,
        reconcile_delay_ms: 3_600_000,
    }
}

pub fn app_state(backend: Arc<FakeBackend>) -> AppState {
    let config = config();
    let engine = PayrollEngine::new(backend, Duration::from_millis(config.reconcile_delay_ms));
    AppState::new(engine, config)
}

pub fn token(user_id: i64, role: Role) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        username: format!("user{}", user_id),
        role,
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}
