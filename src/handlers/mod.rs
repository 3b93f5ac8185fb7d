pub mod general;
pub mod payroll;
