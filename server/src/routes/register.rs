//! Account registration and email verification.
//!
//! Sign-up creates an inactive account with an embedded verification
//! token and mails the activation link. Accounts only become usable
//! once the `/verify/{token}` link is followed within the token's
//! lifetime.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use mongodb::bson::{doc, DateTime, Document};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};

use mediflow_validation::{validate_sign_up, SignUpFields};

use crate::auth::Role;
use crate::error::ApiError;
use crate::models::profile::{Doctor, Patient};
use crate::models::user::{User, VerificationToken};
use crate::state::AppState;

/// Token lifetime, 3 hours in milliseconds.
const TOKEN_TTL_MS: i64 = 3 * 60 * 60 * 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signUp", post(sign_up))
        .route("/verify/{token}", get(verify))
}

fn new_verification_token() -> VerificationToken {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    VerificationToken {
        token: Some(token),
        expires: Utc::now().timestamp_millis() + TOKEN_TTL_MS,
    }
}

/// One account per email; the guard runs against the existing lookup
/// result so the rule is the same wherever accounts are created.
pub(crate) fn ensure_email_unused(existing: Option<&User>) -> Result<(), ApiError> {
    match existing {
        Some(_) => Err(ApiError::Conflict("Email already exists".to_string())),
        None => Ok(()),
    }
}

/// Store-side form of [`VerificationToken::redeems`]: match the token
/// value and require a still-future expiry in one filter.
fn verification_filter(token: &str, now_ms: i64) -> Document {
    doc! {
        "verification_token.token": token,
        "verification_token.expires": { "$gt": now_ms },
    }
}

async fn sign_up(
    State(state): State<AppState>,
    Json(fields): Json<SignUpFields>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let result = validate_sign_up(&fields);
    if !result.is_valid() {
        return Err(ApiError::validation(result));
    }

    // Validation guarantees presence, so the defaults are unreachable.
    let email = fields.email.as_deref().unwrap_or_default().trim().to_lowercase();
    let first_name = fields.first_name.as_deref().unwrap_or_default().trim().to_string();
    let last_name = fields.last_name.as_deref().unwrap_or_default().trim().to_string();
    let password = fields.password.as_deref().unwrap_or_default();
    let role: Role = fields
        .user_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::invalid("User Type is invalid"))?;

    let existing = state.db.users().find_one(doc! { "email": &email }).await?;
    ensure_email_unused(existing.as_ref())?;

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let token = new_verification_token();
    let user = User {
        id: None,
        email: email.clone(),
        username: email.clone(),
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        password_hash,
        user_type: role,
        activated: false,
        verification_token: Some(token.clone()),
        created_at: DateTime::now(),
    };
    let inserted = state.db.users().insert_one(&user).await?;
    let user_id = inserted
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("insert returned non-ObjectId key")))?;

    match role {
        Role::Doctor => {
            let doctor = Doctor {
                id: None,
                user_id,
                first_name,
                last_name,
                email: email.clone(),
                username: email.clone(),
                department: None,
                phone: None,
            };
            state.db.doctors().insert_one(&doctor).await?;
        }
        Role::Patient => {
            let patient = Patient {
                id: None,
                user_id,
                first_name,
                last_name,
                email: email.clone(),
                username: email.clone(),
                address: None,
                phone: None,
                date_of_birth: None,
            };
            state.db.patients().insert_one(&patient).await?;
        }
        Role::Admin => {}
    }

    if let Some(token) = &token.token {
        state.mailer.send_verification(&email, token).await?;
    }
    tracing::info!(user = %user_id, %role, "account registered, verification mail sent");
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

/// Activate the account whose unexpired token matches, clearing the
/// token so the link cannot be replayed. Unknown, expired, and
/// already-used tokens are indistinguishable to the caller.
async fn verify(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<&'static str, ApiError> {
    let now = Utc::now().timestamp_millis();
    let updated = state
        .db
        .users()
        .find_one_and_update(
            verification_filter(&token, now),
            doc! { "$set": { "activated": true, "verification_token.token": null } },
        )
        .await?;
    match updated {
        Some(user) => {
            tracing::info!(email = %user.email, "account verified");
            Ok("Email verified")
        }
        None => Err(ApiError::NotFound("Unable to verify account".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_token_is_alphanumeric_and_long() {
        let token = new_verification_token();
        let value = token.token.unwrap();
        assert_eq!(value.len(), 64);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn verification_token_expires_in_the_future() {
        let token = new_verification_token();
        let now = Utc::now().timestamp_millis();
        assert!(token.expires > now);
        assert!(token.expires <= now + TOKEN_TTL_MS + 1000);
    }

    #[test]
    fn tokens_are_unique() {
        let a = new_verification_token().token.unwrap();
        let b = new_verification_token().token.unwrap();
        assert_ne!(a, b);
    }

    fn stored_token(expires: i64) -> VerificationToken {
        VerificationToken {
            token: Some("abc123".to_string()),
            expires,
        }
    }

    #[test]
    fn expired_token_never_redeems() {
        let now = Utc::now().timestamp_millis();
        assert!(!stored_token(now - 1).redeems("abc123", now));
        assert!(!stored_token(now).redeems("abc123", now));
    }

    #[test]
    fn unexpired_matching_token_redeems() {
        let now = Utc::now().timestamp_millis();
        assert!(stored_token(now + 1000).redeems("abc123", now));
    }

    #[test]
    fn mismatched_or_cleared_token_never_redeems() {
        let now = Utc::now().timestamp_millis();
        assert!(!stored_token(now + 1000).redeems("other", now));
        let cleared = VerificationToken {
            token: None,
            expires: now + 1000,
        };
        assert!(!cleared.redeems("abc123", now));
    }

    #[test]
    fn verification_filter_requires_match_and_future_expiry() {
        let filter = verification_filter("abc123", 1_700_000_000_000);
        assert_eq!(
            filter.get_str("verification_token.token").unwrap(),
            "abc123"
        );
        assert_eq!(
            filter
                .get_document("verification_token.expires")
                .unwrap()
                .get_i64("$gt")
                .unwrap(),
            1_700_000_000_000
        );
    }

    #[test]
    fn second_sign_up_with_same_email_is_a_conflict() {
        let existing = User {
            id: None,
            email: "alice@example.com".to_string(),
            username: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Johnson".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            user_type: Role::Patient,
            activated: true,
            verification_token: None,
            created_at: DateTime::now(),
        };
        assert!(matches!(
            ensure_email_unused(Some(&existing)),
            Err(ApiError::Conflict(msg)) if msg == "Email already exists"
        ));
        assert!(ensure_email_unused(None).is_ok());
    }
}
