//! Dashboard counters and the "next appointment" card.

use std::collections::HashSet;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde_json::{json, Value};

use crate::auth::{AdminAuth, AuthUser, DoctorAuth, Role};
use crate::error::ApiError;
use crate::models::appointment::Appointment;
use crate::routes::appointments::appointment_views;
use crate::routes::parse_object_id;
use crate::schedule;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/count/users", post(count_users))
        .route("/dashboard/count/appointments", get(count_appointments))
        .route("/dashboard/count/patients/treated", get(count_treated))
        .route("/dashboard/appointments/next", get(next_appointment))
}

async fn count_users(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Value>, ApiError> {
    let users = state.db.users();
    let patients = users
        .count_documents(doc! { "user_type": Role::Patient.to_string() })
        .await?;
    let doctors = users
        .count_documents(doc! { "user_type": Role::Doctor.to_string() })
        .await?;
    let admins = users
        .count_documents(doc! { "user_type": Role::Admin.to_string() })
        .await?;
    Ok(Json(json!({
        "message": "success",
        "counts": { "patients": patients, "doctors": doctors, "admins": admins },
    })))
}

async fn count_appointments(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let appointments = state.db.appointments();
    let total = appointments.count_documents(doc! {}).await?;
    let booked = appointments
        .count_documents(doc! { "is_time_slot_available": false })
        .await?;
    Ok(Json(json!({
        "message": "success",
        "counts": { "total": total, "booked": booked },
    })))
}

/// Distinct patients seen by the calling doctor, counting only booked
/// slots whose instant has already passed.
async fn count_treated(
    State(state): State<AppState>,
    DoctorAuth(claims): DoctorAuth,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let doctor = state
        .db
        .doctors()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;
    let doctor_id = doctor
        .id
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("stored doctor without id")))?;

    let appointments: Vec<Appointment> = state
        .db
        .appointments()
        .find(doc! { "doctor_id": doctor_id, "is_time_slot_available": false })
        .await?
        .try_collect()
        .await?;
    let now = Utc::now().naive_utc();
    let treated: HashSet<_> = appointments
        .iter()
        .filter(|a| a.instant().is_some_and(|instant| instant < now))
        .filter_map(|a| a.patient_id)
        .collect();
    Ok(Json(
        json!({ "message": "success", "count": treated.len() }),
    ))
}

/// The calling patient's earliest strictly-future appointment, or
/// `null` when none is scheduled.
async fn next_appointment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let patient = state
        .db
        .patients()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;
    let patient_id = patient
        .id
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("stored patient without id")))?;

    let appointments: Vec<Appointment> = state
        .db
        .appointments()
        .find(doc! { "patient_id": patient_id, "is_time_slot_available": false })
        .await?
        .try_collect()
        .await?;
    let now = Utc::now().naive_utc();
    let next = schedule::next_upcoming(appointments, now, Appointment::instant);
    let view = match next {
        Some(appointment) => appointment_views(&state, vec![appointment])
            .await?
            .into_iter()
            .next(),
        None => None,
    };
    Ok(Json(json!({ "message": "success", "appointment": view })))
}
