pub mod backend;
pub mod calculator;
pub mod hrms;
pub mod lifecycle;
pub mod payroll;
pub mod reconcile;
