pub mod app;
pub mod avatar;
pub mod category;
pub mod comment;
pub mod config;
pub mod database;
pub mod middleware;
pub mod post;
pub mod realtime;
pub mod router;
pub mod user;
pub mod utils;
