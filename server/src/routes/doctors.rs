//! Doctor directory.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::{is_valid_email, is_valid_name};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::models::profile::{Doctor, DoctorResponse};
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/doctors", get(list_doctors))
        .route("/doctors", post(create_doctor))
        .route("/doctors/{id}", get(get_doctor))
        .route("/doctors/{id}", patch(update_doctor))
        .route("/doctors/{id}", delete(delete_doctor))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoctorQuery {
    pub department: Option<String>,
}

async fn list_doctors(
    State(state): State<AppState>,
    _auth: AuthUser,
    axum::extract::Query(query): axum::extract::Query<DoctorQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Document::new();
    if let Some(department) = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        filter.insert("department", department);
    }
    let doctors: Vec<Doctor> = state
        .db
        .doctors()
        .find(filter)
        .await?
        .try_collect()
        .await?;
    let doctors: Vec<DoctorResponse> = doctors.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "message": "success", "doctors": doctors })))
}

async fn get_doctor(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "doctor")?;
    let doctor = state
        .db
        .doctors()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "doctor": DoctorResponse::from(doctor) }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

async fn create_doctor(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut errors = Vec::new();
    if !is_valid_name(request.first_name.trim()) {
        errors.push("First name is invalid".to_string());
    }
    if !is_valid_name(request.last_name.trim()) {
        errors.push("Last name is invalid".to_string());
    }
    if !is_valid_email(request.email.trim()) {
        errors.push("Invalid email format".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let user_id = parse_object_id(&request.user_id, "user")?;
    if state.db.users().find_one(doc! { "_id": user_id }).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let email = request.email.trim().to_lowercase();
    let doctor = Doctor {
        id: None,
        user_id,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: email.clone(),
        username: email,
        department: request.department,
        phone: request.phone,
    };
    state.db.doctors().insert_one(&doctor).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDoctorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
}

async fn update_doctor(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "doctor")?;
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
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Doctor not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

async fn delete_doctor(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "doctor")?;
    let result = state.db.doctors().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Doctor not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}
