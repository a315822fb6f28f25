//! Business rules that do not touch storage.

pub mod calendar;
pub mod check_in;
pub mod dashboard;
pub mod leave_accrual;
pub mod review;
pub mod routing;
pub mod wfh_export;
