use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};

use crate::utils::error::CustomError;

/// Parse a hex object id coming from a path or body, naming the entity in the error.
pub fn parse_object_id(raw: &str, entity: &str) -> Result<ObjectId, CustomError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| CustomError::BadRequestError(format!("Invalid {} ID format", entity)))
}

pub fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

pub fn now() -> bson::DateTime {
    bson::DateTime::from_millis(Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_id_rejects_garbage() {
        let err = parse_object_id("not-an-id", "post").unwrap_err();
        assert_eq!(err.to_string(), "Bad Request: Invalid post ID format");
    }

    #[test]
    fn parse_object_id_accepts_hex() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "post").unwrap(), id);
    }

    #[test]
    fn bson_datetime_round_trips_through_chrono() {
        let dt = bson::DateTime::from_millis(1_700_000_000_123);
        assert_eq!(to_chrono(dt).timestamp_millis(), 1_700_000_000_123);
    }
}
