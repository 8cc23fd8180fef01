//! Account administration, admin-only.
//!
//! Admin-created accounts skip email verification and come up
//! activated; deletion cascades to the doctor or patient profile the
//! account owns.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::{is_valid_email, is_valid_name, validate_sign_up, SignUpFields};

use crate::auth::{AdminAuth, Role};
use crate::error::ApiError;
use crate::models::profile::{Doctor, Patient};
use crate::models::user::{User, UserResponse};
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}", patch(update_user))
        .route("/users/{id}", delete(delete_user))
}

async fn list_users(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Value>, ApiError> {
    let users: Vec<User> = state.db.users().find(doc! {}).await?.try_collect().await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "message": "success", "users": users })))
}

async fn get_user(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "user")?;
    let user = state
        .db
        .users()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "user": UserResponse::from(user) }),
    ))
}

async fn create_user(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(fields): Json<SignUpFields>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let result = validate_sign_up(&fields);
    if !result.is_valid() {
        return Err(ApiError::validation(result));
    }
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
    crate::routes::register::ensure_email_unused(existing.as_ref())?;

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let user = User {
        id: None,
        email: email.clone(),
        username: email.clone(),
        first_name: first_name.clone(),
        last_name: last_name.clone(),
        password_hash,
        user_type: role,
        activated: true,
        verification_token: None,
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
                username: email,
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
                username: email,
                address: None,
                phone: None,
                date_of_birth: None,
            };
            state.db.patients().insert_one(&patient).await?;
        }
        Role::Admin => {}
    }
    tracing::info!(user = %user_id, %role, "account created by admin");
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

async fn update_user(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "user")?;
    let mut set = Document::new();
    if let Some(first_name) = request.first_name.as_deref().map(str::trim) {
        if !is_valid_name(first_name) {
            return Err(ApiError::invalid("First name is invalid"));
        }
        set.insert("first_name", first_name);
    }
    if let Some(last_name) = request.last_name.as_deref().map(str::trim) {
        if !is_valid_name(last_name) {
            return Err(ApiError::invalid("Last name is invalid"));
        }
        set.insert("last_name", last_name);
    }
    if let Some(email) = request.email.as_deref().map(str::trim) {
        if !is_valid_email(email) {
            return Err(ApiError::invalid("Invalid email format"));
        }
        let email = email.to_lowercase();
        if state
            .db
            .users()
            .find_one(doc! { "email": &email, "_id": { "$ne": id } })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
        set.insert("email", email);
    }
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }
    let result = state
        .db
        .users()
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

async fn delete_user(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "user")?;
    let result = state.db.users().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    // Orphaned profiles would still show up in directory listings.
    state.db.doctors().delete_many(doc! { "user_id": id }).await?;
    state.db.patients().delete_many(doc! { "user_id": id }).await?;
    tracing::info!(user = %id, "account deleted");
    Ok(Json(json!({ "message": "success" })))
}
