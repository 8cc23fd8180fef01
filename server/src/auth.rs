//! Bearer-token authentication and role gates.
//!
//! Three extractors gate routes: [`AuthUser`] (any authenticated role),
//! [`DoctorAuth`] (doctor or admin), and [`AdminAuth`] (admin only).
//! Each one re-reads and re-verifies the `Authorization: Bearer` header
//! on every request; nothing is cached between requests. Roles are a
//! closed enum so a new role is a compile-time-visible change at every
//! gate.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Account role. Serialized exactly as stored on the user document.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Patient => write!(f, "Patient"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(Role::Patient),
            "Doctor" => Ok(Role::Doctor),
            "Admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Claims embedded in issued bearer tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: hex user id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Signing and verification keys derived once from the configured
/// secret, plus the issued-token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(&self, user_id: &str, email: &str, role: Role) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ApiError::Dependency(anyhow::Error::new(err).context("token signing")))
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ApiError::Auth("Unauthorized".to_string()))
    }
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Auth("Unauthorized".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("Unauthorized".to_string()))?;
    state.jwt.verify(token)
}

/// Any authenticated account.
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state).map(AuthUser)
    }
}

/// Doctor-gated routes; admins are admitted as well.
pub struct DoctorAuth(pub Claims);

impl FromRequestParts<AppState> for DoctorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        match claims.role {
            Role::Doctor | Role::Admin => Ok(DoctorAuth(claims)),
            Role::Patient => Err(ApiError::Auth("Unauthorized".to_string())),
        }
    }
}

/// Admin-only routes.
pub struct AdminAuth(pub Claims);

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        match claims.role {
            Role::Admin => Ok(AdminAuth(claims)),
            Role::Patient | Role::Doctor => Err(ApiError::Auth("Unauthorized".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("testsecret", 24)
    }

    #[test]
    fn issued_token_round_trips() {
        let keys = keys();
        let token = keys.issue("64b0c5...", "alice@example.com", Role::Doctor).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Doctor);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = keys();
        let token = keys.issue("id", "a@b.co", Role::Admin).unwrap();
        let other = JwtKeys::new("different-secret", 24);
        assert!(matches!(other.verify(&token), Err(ApiError::Auth(_))));
        assert!(matches!(keys.verify("not-a-token"), Err(ApiError::Auth(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::new("testsecret", -1);
        let token = keys.issue("id", "a@b.co", Role::Patient).unwrap();
        assert!(matches!(keys.verify(&token), Err(ApiError::Auth(_))));
    }

    #[test]
    fn role_string_round_trip() {
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("Nurse".parse::<Role>().is_err());
    }
}
