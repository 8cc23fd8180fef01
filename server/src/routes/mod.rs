//! HTTP surface.
//!
//! Each submodule owns one resource and contributes a router; gates are
//! applied per route via the extractors in [`crate::auth`].

pub mod appointments;
pub mod dashboard;
pub mod doctors;
pub mod medicines;
pub mod patients;
pub mod prescriptions;
pub mod profile;
pub mod register;
pub mod session;
pub mod users;

use axum::Router;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(register::router())
        .merge(session::router())
        .merge(appointments::router())
        .merge(prescriptions::router())
        .merge(medicines::router())
        .merge(patients::router())
        .merge(doctors::router())
        .merge(users::router())
        .merge(profile::router())
        .merge(dashboard::router())
        .with_state(state)
}

/// Parse a client-submitted hex id; malformed ids are validation
/// errors, not dependency failures.
pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::invalid(&format!("Invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_validation_errors() {
        let err = parse_object_id("zzz", "doctor").unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors, vec!["Invalid doctor id"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn well_formed_ids_parse() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "slot").unwrap(), id);
    }
}
