pub mod global_error_handler;
pub mod jwt;
pub mod password;
pub mod response;
