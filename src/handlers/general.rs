use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::json;

/// Root handler, an HTML landing page listing the payroll routes
pub async fn root_handler() -> impl IntoResponse {
    Html(r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Payroll Desk API</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: 'Segoe UI', system-ui, sans-serif; background: #0f172a; color: #e2e8f0; min-height: 100vh; padding: 40px 20px; }
    .container { max-width: 860px; margin: 0 auto; }
    header { text-align: center; margin-bottom: 40px; }
    header h1 { font-size: 2.4rem; font-weight: 800; color: #38bdf8; margin-bottom: 8px; }
    header p { color: #94a3b8; }
    .routes { background: #1e293b; border: 1px solid #334155; border-radius: 12px; padding: 24px; }
    .route-item { display: flex; gap: 12px; padding: 8px 0; border-bottom: 1px solid #0f172a; }
    .method { font-size: 0.7rem; font-weight: 700; padding: 2px 8px; border-radius: 4px; min-width: 52px; text-align: center; font-family: monospace; }
    .get { background: #064e3b; color: #34d399; }
    .post { background: #1e3a5f; color: #60a5fa; }
    .put { background: #451a03; color: #fb923c; }
    .route-path { font-family: monospace; font-size: 0.85rem; flex: 1; }
    .route-desc { font-size: 0.8rem; color: #64748b; }
    a { color: #38bdf8; }
    footer { text-align: center; margin-top: 32px; color: #475569; font-size: 0.85rem; }
  </style>
</head>
<body>
<div class="container">
  <header>
    <h1>Payroll Desk API</h1>
    <p>Monthly payroll preparation and payment on top of the HRMS backend</p>
    <p><a href="/docs">Swagger UI</a> · <a href="/health">Health</a></p>
  </header>

  <div class="routes">
    <div class="route-item"><span class="method get">GET</span><span class="route-path">/api/v1/payroll/periods/{year}/{month}</span><span class="route-desc">Entries, deduction types and totals</span></div>
    <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/payroll/periods/{year}/{month}/refresh</span><span class="route-desc">Reload the month from the backend</span></div>
    <div class="route-item"><span class="method put">PUT</span><span class="route-path">/api/v1/payroll/periods/{year}/{month}/entries/{assignment_id}</span><span class="route-desc">Edit and save a draft entry</span></div>
    <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/payroll/periods/{year}/{month}/entries/{assignment_id}/pay</span><span class="route-desc">Pay one employee</span></div>
    <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/payroll/periods/{year}/{month}/pay-all</span><span class="route-desc">Pay every unpaid entry</span></div>
    <div class="route-item"><span class="method post">POST</span><span class="route-path">/api/v1/payroll/net-salary/preview</span><span class="route-desc">Net salary of an unsaved form</span></div>
  </div>

  <footer>
    <p>Built with Rust · Axum · reqwest</p>
  </footer>
</div>
</body>
</html>"#)
}

/// Health check endpoint; probes the HRMS backend
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.probe_backend().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "hrms": "reachable",
                "service": "payroll-desk",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "hrms": "unreachable",
                "error": e.to_string()
            })),
        ),
    }
}
