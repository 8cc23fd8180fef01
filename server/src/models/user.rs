use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Account activation token: a random value plus a millisecond-epoch
/// expiry. The value is cleared on successful verification; the record
/// itself stays on the user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationToken {
    pub token: Option<String>,
    pub expires: i64,
}

impl VerificationToken {
    /// True when `candidate` matches the stored value and the expiry is
    /// still in the future. A cleared token redeems nothing.
    pub fn redeems(&self, candidate: &str, now_ms: i64) -> bool {
        self.token.as_deref() == Some(candidate) && self.expires > now_ms
    }
}

/// Identity record. One per email; never hard-deleted by the
/// registration flows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub user_type: Role,
    pub activated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<VerificationToken>,
    pub created_at: DateTime,
}

/// User as returned by the API: no password hash, hex id.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: Role,
    pub activated: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            user_type: user.user_type,
            activated: user.activated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_never_carries_the_hash() {
        let user = User {
            id: Some(ObjectId::new()),
            email: "alice@example.com".into(),
            username: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Johnson".into(),
            password_hash: "$2b$12$secret".into(),
            user_type: Role::Patient,
            activated: true,
            verification_token: None,
            created_at: DateTime::now(),
        };
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"firstName\":\"Alice\""));
    }
}
