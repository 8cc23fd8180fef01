//! Self-service profile pages, keyed by account id.
//!
//! Unlike the admin directories these are looked up by `user_id`, the
//! id carried in the caller's token. An admin has no separate profile
//! document; their profile is the account record itself.

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::is_valid_name;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::profile::{DoctorResponse, PatientResponse};
use crate::models::user::UserResponse;
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/admin/{user_id}", get(get_admin_profile))
        .route("/profile/admin/{user_id}", patch(update_admin_profile))
        .route("/profile/patient/{user_id}", get(get_patient_profile))
        .route("/profile/patient/{user_id}", patch(update_patient_profile))
        .route("/profile/doctor/{user_id}", get(get_doctor_profile))
        .route("/profile/doctor/{user_id}", patch(update_doctor_profile))
}

async fn get_admin_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let user = state
        .db
        .users()
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "profile": UserResponse::from(user) }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

async fn update_admin_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<AdminProfilePatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
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
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }
    let result = state
        .db
        .users()
        .update_one(doc! { "_id": user_id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

async fn get_patient_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let patient = state
        .db
        .patients()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "profile": PatientResponse::from(patient) }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientProfilePatch {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
}

async fn update_patient_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<PatientProfilePatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let mut set = Document::new();
    if let Some(address) = &request.address {
        set.insert("address", address.trim());
    }
    if let Some(phone) = &request.phone {
        set.insert("phone", phone.trim());
    }
    if let Some(date_of_birth) = &request.date_of_birth {
        set.insert("date_of_birth", date_of_birth.trim());
    }
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }
    let result = state
        .db
        .patients()
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

async fn get_doctor_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let doctor = state
        .db
        .doctors()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "profile": DoctorResponse::from(doctor) }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorProfilePatch {
    pub department: Option<String>,
    pub phone: Option<String>,
}

async fn update_doctor_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<DoctorProfilePatch>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let mut set = Document::new();
    if let Some(department) = &request.department {
        set.insert("department", department.trim());
    }
    if let Some(phone) = &request.phone {
        set.insert("phone", phone.trim());
    }
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }
    let result = state
        .db
        .doctors()
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}
