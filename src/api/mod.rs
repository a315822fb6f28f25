pub mod attendance;
pub mod dashboard;
pub mod employees;
pub mod leave_request;
pub mod profile;
pub mod settings;
pub mod wfh_request;
