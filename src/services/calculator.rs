// src/services/calculator.rs

use crate::models::{Deduction, NetSalaryBreakdown, Period};
use chrono::{Datelike, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};

pub const HOURS_PER_WORKING_DAY: u32 = 8;

/// Everything net salary depends on, borrowed from an entry or a form.
#[derive(Debug, Clone, Copy)]
pub struct SalaryInputs<'a> {
    pub gross_salary: Decimal,
    pub bonus_amount: Decimal,
    pub hour_variance: Decimal,
    pub deductions: &'a [Deduction],
}

/// Mon–Fri days in the period
pub fn weekday_count(period: Period) -> u32 {
    period
        .days()
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

pub fn expected_hours(period: Period) -> u32 {
    weekday_count(period) * HOURS_PER_WORKING_DAY
}

pub fn hourly_rate(gross_salary: Decimal, period: Period) -> Decimal {
    let hours = expected_hours(period);
    if hours == 0 || gross_salary <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    gross_salary / Decimal::from(hours)
}

/// Only a shortfall (negative variance) against a positive gross salary costs
/// money. Overtime is neither deducted nor credited. `None` on overflow.
pub fn hour_variance_deduction(
    hour_variance: Decimal,
    gross_salary: Decimal,
    period: Period,
) -> Option<Decimal> {
    if hour_variance >= Decimal::ZERO || gross_salary <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    hour_variance.abs().checked_mul(hourly_rate(gross_salary, period))
}

/// Sum of the deductions that will actually be persisted. `None` on overflow.
pub fn total_deductions(deductions: &[Deduction]) -> Option<Decimal> {
    deductions
        .iter()
        .filter(|d| d.is_persistable())
        .try_fold(Decimal::ZERO, |sum, d| sum.checked_add(d.amount))
}

/// `None` when the amounts are too large for `Decimal` arithmetic.
pub fn breakdown(inputs: SalaryInputs<'_>, period: Period) -> Option<NetSalaryBreakdown> {
    let weekday_count = weekday_count(period);
    let hour_variance_deduction =
        hour_variance_deduction(inputs.hour_variance, inputs.gross_salary, period)?;
    let total_deductions = total_deductions(inputs.deductions)?;

    let net_salary = inputs
        .gross_salary
        .checked_add(inputs.bonus_amount)?
        .checked_sub(total_deductions)?
        .checked_sub(hour_variance_deduction)?
        .max(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Some(NetSalaryBreakdown {
        weekday_count,
        expected_hours: weekday_count * HOURS_PER_WORKING_DAY,
        hourly_rate: hourly_rate(inputs.gross_salary, period),
        hour_variance_deduction,
        total_deductions,
        net_salary,
    })
}

/// `max(0, gross + bonus − Σdeductions − hour-variance deduction)`, rounded
/// to cents. Every code path that needs a net salary goes through here.
pub fn net_salary(inputs: SalaryInputs<'_>, period: Period) -> Option<Decimal> {
    breakdown(inputs, period).map(|b| b.net_salary)
}
