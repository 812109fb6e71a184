//! Attendance, leave and payroll rules. Handlers in `api` translate HTTP
//! into these calls; the stores are passed in explicitly.

pub mod attendance;
pub mod clock;
pub mod leave;
pub mod payroll;
pub mod reconciliation;
