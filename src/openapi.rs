// src/openapi.rs

use crate::models::{
    Deduction, DeductionInput, DeductionType, EditEntryRequest, EntryView, NetSalaryBreakdown,
    NetSalaryPreviewRequest, PayAllOutcome, PayrollEntry, Period, PeriodTotals, PeriodView,
    RunStatus,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Desk API",
        version = "1.0.0",
        description = "Monthly payroll for HR managers: review entries, adjust pay, \
            and mark employees paid individually or in bulk. Persistence and payment \
            are delegated to the HRMS backend; tokens are issued by the HRMS login.",
        license(name = "MIT")
    ),
    paths(
        crate::handlers::payroll::get_period,
        crate::handlers::payroll::refresh_period,
        crate::handlers::payroll::save_entry,
        crate::handlers::payroll::pay_entry,
        crate::handlers::payroll::pay_all,
        crate::handlers::payroll::preview_net_salary,
    ),
    components(
        schemas(
            Period, RunStatus, DeductionType, DeductionInput, Deduction,
            PayrollEntry, EntryView, PeriodTotals, PeriodView, PayAllOutcome,
            EditEntryRequest, NetSalaryPreviewRequest, NetSalaryBreakdown,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Payroll", description = "Prepare, save and pay a month of payroll"),
    )
)]
pub struct ApiDoc;
