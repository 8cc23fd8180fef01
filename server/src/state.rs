//! Shared per-request state.
//!
//! Everything here is constructed once in `main` from the configuration
//! and cloned into handlers; the database handle is the only
//! cross-request shared resource.

use crate::auth::JwtKeys;
use crate::db::Db;
use crate::mailer::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub jwt: JwtKeys,
    pub mailer: Mailer,
}
