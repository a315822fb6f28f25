pub mod attendance;
pub mod leave_request;
pub mod role;
pub mod settings;
pub mod user;
pub mod wfh_request;
