//! Login and token issuance.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mongodb::bson::doc;
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::validate_login;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A wrong email and a wrong password produce the same error, so the
/// endpoint cannot be used to probe which addresses have accounts.
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = validate_login(&request.email, &request.password);
    if !result.is_valid() {
        return Err(ApiError::validation(result));
    }
    let email = request
        .email
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let password = request.password.as_deref().unwrap_or_default();

    let user = state
        .db
        .users()
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid email or password".to_string()))?;
    if !bcrypt::verify(password, &user.password_hash)? {
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    }
    if !user.activated {
        return Err(ApiError::Auth("Account is not verified".to_string()));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("stored user without id")))?;
    let token = state
        .jwt
        .issue(&user_id.to_hex(), &user.email, user.user_type)?;
    tracing::info!(user = %user_id, role = %user.user_type, "login succeeded");
    Ok(Json(json!({
        "message": "success",
        "token": token,
        "userType": user.user_type.to_string(),
        "userId": user_id.to_hex(),
        "firstName": user.first_name,
        "lastName": user.last_name,
    })))
}
