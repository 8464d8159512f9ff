pub mod auth;
pub mod error_handler;
pub mod not_found;
pub mod rate_limit;
