pub mod auth;
pub mod bookings;
pub mod listings;
pub mod users;

use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

/// A path id that is not a UUID cannot name an existing record.
pub fn parse_id(raw: &str, missing: ErrorMessage) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw.trim()).map_err(|_| HttpError::not_found(missing.to_string()))
}
