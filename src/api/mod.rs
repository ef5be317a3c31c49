pub mod admin;
pub mod attendance;
pub mod leave_request;
pub mod report;
