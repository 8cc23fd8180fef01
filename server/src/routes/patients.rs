//! Patient directory and per-patient history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::{is_valid_email, is_valid_name};

use crate::auth::{AdminAuth, AuthUser, DoctorAuth};
use crate::error::ApiError;
use crate::models::appointment::Appointment;
use crate::models::prescription::{LineItemView, Prescription, PrescriptionView};
use crate::models::profile::{Patient, PatientResponse};
use crate::routes::appointments::appointment_views;
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/{id}", get(get_patient))
        .route("/patients/{id}", patch(update_patient))
        .route("/patients/{id}", delete(delete_patient))
        .route("/patients/history/{id}", get(patient_history))
        .route("/patients/by-user/{user_id}", get(patient_by_user))
}

async fn list_patients(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let patients: Vec<Patient> = state
        .db
        .patients()
        .find(doc! {})
        .await?
        .try_collect()
        .await?;
    let patients: Vec<PatientResponse> = patients.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "message": "success", "patients": patients })))
}

async fn get_patient(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "patient")?;
    let patient = state
        .db
        .patients()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "patient": PatientResponse::from(patient) }),
    ))
}

/// QR badge lookup: a scanned badge carries the account id, not the
/// profile id.
async fn patient_by_user(
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
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "patient": PatientResponse::from(patient) }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

async fn create_patient(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(request): Json<CreatePatientRequest>,
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
    let patient = Patient {
        id: None,
        user_id,
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: email.clone(),
        username: email,
        address: request.address,
        phone: request.phone,
        date_of_birth: request.date_of_birth,
    };
    state.db.patients().insert_one(&patient).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
}

async fn update_patient(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "patient")?;
    let set = patient_patch(&request)?;
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }
    let result = state
        .db
        .patients()
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

fn patient_patch(request: &UpdatePatientRequest) -> Result<Document, ApiError> {
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
    if let Some(address) = &request.address {
        set.insert("address", address.trim());
    }
    if let Some(phone) = &request.phone {
        set.insert("phone", phone.trim());
    }
    if let Some(date_of_birth) = &request.date_of_birth {
        set.insert("date_of_birth", date_of_birth.trim());
    }
    Ok(set)
}

async fn delete_patient(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "patient")?;
    let result = state.db.patients().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

/// A patient's visit history: their booked appointments plus the
/// prescriptions written against them.
async fn patient_history(
    State(state): State<AppState>,
    _auth: DoctorAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "patient")?;
    if state.db.patients().find_one(doc! { "_id": id }).await?.is_none() {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    let appointments: Vec<Appointment> = state
        .db
        .appointments()
        .find(doc! { "patient_id": id })
        .await?
        .try_collect()
        .await?;
    let appointment_ids: Vec<_> = appointments.iter().filter_map(|a| a.id).collect();
    let prescriptions: Vec<Prescription> = if appointment_ids.is_empty() {
        Vec::new()
    } else {
        state
            .db
            .prescriptions()
            .find(doc! { "appointment_id": { "$in": appointment_ids } })
            .await?
            .try_collect()
            .await?
    };

    let mut views = appointment_views(&state, appointments).await?;
    crate::schedule::sort_most_recent_first(&mut views, |view| {
        crate::schedule::slot_instant(&view.appointment_date, &view.appointment_time)
    });

    let mut prescription_views = Vec::with_capacity(prescriptions.len());
    for prescription in prescriptions {
        let Some(appointment) = views
            .iter()
            .find(|view| view.id == prescription.appointment_id.to_hex())
            .cloned()
        else {
            continue;
        };
        prescription_views.push(PrescriptionView {
            id: prescription.id.map(|pid| pid.to_hex()).unwrap_or_default(),
            remarks: prescription.remarks,
            medicines: prescription
                .medicines
                .into_iter()
                .map(LineItemView::from)
                .collect(),
            appointment,
        });
    }
    crate::schedule::sort_most_recent_first(&mut prescription_views, |view| {
        crate::schedule::slot_instant(
            &view.appointment.appointment_date,
            &view.appointment.appointment_time,
        )
    });

    Ok(Json(json!({
        "message": "success",
        "appointments": views,
        "prescriptions": prescription_views,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_rejects_invalid_name() {
        let request = UpdatePatientRequest {
            first_name: Some("4lice".to_string()),
            ..Default::default()
        };
        assert!(patient_patch(&request).is_err());
    }

    #[test]
    fn patch_sets_only_provided_fields() {
        let request = UpdatePatientRequest {
            phone: Some(" 555-0100 ".to_string()),
            ..Default::default()
        };
        let set = patient_patch(&request).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("phone").unwrap(), "555-0100");
    }
}
