pub mod error;
pub mod hashing;
pub mod helpers;
pub mod password_validation;
