//! Document models and response shapes.
//!
//! Documents live in MongoDB collections and carry `ObjectId` ids;
//! response DTOs hex-encode ids and never expose password hashes.

pub mod appointment;
pub mod medicine;
pub mod prescription;
pub mod profile;
pub mod user;

use serde::Serialize;

/// Compact person reference for joined views: a hex id plus a display
/// name assembled from the profile's first and last name.
#[derive(Clone, Debug, Serialize)]
pub struct PersonBrief {
    pub id: String,
    pub display: String,
}
