pub mod db;
pub mod redis;

pub use db::connect_to_mongo;
pub use self::redis::{RedisService, connect_to_redis};
