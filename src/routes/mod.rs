// src/routes/mod.rs

use crate::{
    handlers::payroll::{
        get_period, pay_all, pay_entry, preview_net_salary, refresh_period, save_entry,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Periods ──────────────────────────────────────────
        .route("/payroll/periods/{year}/{month}", get(get_period))
        .route("/payroll/periods/{year}/{month}/refresh", post(refresh_period))
        // ─── Entries ──────────────────────────────────────────
        .route(
            "/payroll/periods/{year}/{month}/entries/{assignment_id}",
            put(save_entry),
        )
        .route(
            "/payroll/periods/{year}/{month}/entries/{assignment_id}/pay",
            post(pay_entry),
        )
        .route("/payroll/periods/{year}/{month}/pay-all", post(pay_all))
        // ─── Calculator ───────────────────────────────────────
        .route("/payroll/net-salary/preview", post(preview_net_salary))
}
