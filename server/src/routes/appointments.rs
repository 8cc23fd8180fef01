//! Appointment slot management.
//!
//! Slots are created empty by doctors or admins, listed with optional
//! patient/doctor filters, and booked at most once. Duplicate identical
//! slots are permitted: no overlap check is performed when a slot is
//! created.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthUser, DoctorAuth};
use crate::error::ApiError;
use crate::models::appointment::{Appointment, AppointmentView};
use crate::models::PersonBrief;
use crate::routes::parse_object_id;
use crate::schedule;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(list_appointments))
        .route("/appointments/add", post(create_slot))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments", put(book_appointment))
        .route("/appointments/{id}", put(update_slot))
        .route("/appointments", delete(delete_slot))
        .route("/departments", get(get_departments))
}

/// Join slots with doctor/patient briefs in two `$in` fetches.
pub(crate) async fn appointment_views(
    state: &AppState,
    appointments: Vec<Appointment>,
) -> Result<Vec<AppointmentView>, ApiError> {
    let doctor_ids: Vec<ObjectId> = appointments.iter().map(|a| a.doctor_id).collect();
    let patient_ids: Vec<ObjectId> = appointments.iter().filter_map(|a| a.patient_id).collect();

    let mut doctor_map: HashMap<ObjectId, PersonBrief> = HashMap::new();
    if !doctor_ids.is_empty() {
        let doctors = state
            .db
            .doctors()
            .find(doc! { "_id": { "$in": doctor_ids } })
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        for doctor in doctors {
            if let Some(id) = doctor.id {
                let display = doctor.display_name();
                doctor_map.insert(
                    id,
                    PersonBrief {
                        id: id.to_hex(),
                        display,
                    },
                );
            }
        }
    }

    let mut patient_map: HashMap<ObjectId, PersonBrief> = HashMap::new();
    if !patient_ids.is_empty() {
        let patients = state
            .db
            .patients()
            .find(doc! { "_id": { "$in": patient_ids } })
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        for patient in patients {
            if let Some(id) = patient.id {
                let display = patient.display_name();
                patient_map.insert(
                    id,
                    PersonBrief {
                        id: id.to_hex(),
                        display,
                    },
                );
            }
        }
    }

    Ok(appointments
        .into_iter()
        .map(|appointment| {
            let doctor = doctor_map.get(&appointment.doctor_id).cloned();
            let patient = appointment
                .patient_id
                .and_then(|id| patient_map.get(&id).cloned());
            AppointmentView::new(appointment, doctor, patient)
        })
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAppointmentsRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub is_time_slot_available: Option<bool>,
}

/// Optional filters; an empty body returns every slot, which dashboard
/// views use to pick the next future appointment.
async fn list_appointments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<ListAppointmentsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Document::new();
    if let Some(patient_id) = &request.patient_id {
        filter.insert("patient_id", parse_object_id(patient_id, "patient")?);
    }
    if let Some(doctor_id) = &request.doctor_id {
        filter.insert("doctor_id", parse_object_id(doctor_id, "doctor")?);
    }
    if let Some(available) = request.is_time_slot_available {
        filter.insert("is_time_slot_available", available);
    }

    let appointments = state
        .db
        .appointments()
        .find(filter)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    let views = appointment_views(&state, appointments).await?;
    Ok(Json(json!({ "message": "success", "appointments": views })))
}

async fn get_appointment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "appointment")?;
    let appointment = state
        .db
        .appointments()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;
    let views = appointment_views(&state, vec![appointment]).await?;
    Ok(Json(
        json!({ "message": "success", "appointment": views.into_iter().next() }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub doctor_id: String,
    pub date: String,
    pub time: String,
}

async fn create_slot(
    State(state): State<AppState>,
    _auth: DoctorAuth,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let date = schedule::parse_slot_date(&request.date);
    let time = schedule::parse_slot_time(&request.time);
    let doctor_id = ObjectId::parse_str(request.doctor_id.trim()).ok();

    let mut errors = Vec::new();
    if date.is_none() {
        errors.push("Invalid appointment date".to_string());
    }
    if time.is_none() {
        errors.push("Invalid appointment time".to_string());
    }
    if doctor_id.is_none() {
        errors.push("Invalid doctor id".to_string());
    }
    let (Some(date), Some(doctor_id)) = (date, doctor_id) else {
        return Err(ApiError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if state
        .db
        .doctors()
        .find_one(doc! { "_id": doctor_id })
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Doctor not found".to_string()));
    }

    let slot = Appointment {
        id: None,
        doctor_id,
        appointment_date: date.format("%Y-%m-%d").to_string(),
        appointment_time: request.time.trim().to_string(),
        is_time_slot_available: true,
        patient_id: None,
    };
    let inserted = state.db.appointments().insert_one(&slot).await?;
    tracing::info!(slot = ?inserted.inserted_id, "appointment slot created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "success", "id": object_id_hex(&inserted.inserted_id) })),
    ))
}

fn object_id_hex(id: &Bson) -> Option<String> {
    match id {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub id: String,
    pub patient_id: String,
}

/// Booking precondition: the slot must exist and still be open. A
/// taken slot keeps its patient reference untouched.
fn booking_decision(slot: Option<&Appointment>) -> Result<(), ApiError> {
    match slot {
        None => Err(ApiError::NotFound("Appointment not found".to_string())),
        Some(slot) if !slot.is_time_slot_available => {
            Err(ApiError::Conflict("Time slot is already booked".to_string()))
        }
        Some(_) => Ok(()),
    }
}

/// Book a slot for a patient, at most once.
///
/// Read-then-update over a single document: two requests racing on the
/// same slot are decided by write order, last writer wins at the field
/// level.
async fn book_appointment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let slot_id = parse_object_id(&request.id, "appointment")?;
    let patient_id = parse_object_id(&request.patient_id, "patient")?;

    let slot = state
        .db
        .appointments()
        .find_one(doc! { "_id": slot_id })
        .await?;
    booking_decision(slot.as_ref())?;
    if state
        .db
        .patients()
        .find_one(doc! { "_id": patient_id })
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Patient not found".to_string()));
    }

    state
        .db
        .appointments()
        .update_one(
            doc! { "_id": slot_id },
            doc! { "$set": { "patient_id": patient_id, "is_time_slot_available": false } },
        )
        .await?;
    tracing::info!(slot = %slot_id, patient = %patient_id, "appointment booked");
    Ok(Json(json!({ "message": "success" })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSlotRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub doctor_id: Option<String>,
}

/// Partial update of a slot's date, time, or doctor.
async fn update_slot(
    State(state): State<AppState>,
    _auth: DoctorAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "appointment")?;

    let mut set = Document::new();
    if let Some(date) = &request.date {
        let parsed = schedule::parse_slot_date(date)
            .ok_or_else(|| ApiError::invalid("Invalid appointment date"))?;
        set.insert("appointment_date", parsed.format("%Y-%m-%d").to_string());
    }
    if let Some(time) = &request.time {
        schedule::parse_slot_time(time)
            .ok_or_else(|| ApiError::invalid("Invalid appointment time"))?;
        set.insert("appointment_time", time.trim());
    }
    if let Some(doctor_id) = &request.doctor_id {
        set.insert("doctor_id", parse_object_id(doctor_id, "doctor")?);
    }
    if set.is_empty() {
        return Err(ApiError::invalid("Nothing to update"));
    }

    let result = state
        .db
        .appointments()
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Appointment not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteSlotRequest {
    pub id: String,
}

async fn delete_slot(
    State(state): State<AppState>,
    _auth: DoctorAuth,
    Json(request): Json<DeleteSlotRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&request.id, "appointment")?;
    let result = state.db.appointments().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Appointment not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

/// Distinct doctor departments, for the booking form's department
/// picker.
async fn get_departments(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let values = state
        .db
        .doctors()
        .distinct("department", doc! { "department": { "$ne": Bson::Null } })
        .await?;
    let mut departments: Vec<String> = values
        .into_iter()
        .filter_map(|value| match value {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect();
    departments.sort();
    Ok(Json(json!({ "message": "success", "departments": departments })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(available: bool, patient: Option<ObjectId>) -> Appointment {
        Appointment {
            id: Some(ObjectId::new()),
            doctor_id: ObjectId::new(),
            appointment_date: "2025-01-10".to_string(),
            appointment_time: "10:00 AM".to_string(),
            is_time_slot_available: available,
            patient_id: patient,
        }
    }

    #[test]
    fn booking_unknown_slot_is_not_found() {
        assert!(matches!(
            booking_decision(None),
            Err(ApiError::NotFound(msg)) if msg == "Appointment not found"
        ));
    }

    #[test]
    fn booking_taken_slot_is_conflict_and_leaves_patient_alone() {
        let original_patient = ObjectId::new();
        let taken = slot(false, Some(original_patient));
        assert!(matches!(
            booking_decision(Some(&taken)),
            Err(ApiError::Conflict(msg)) if msg == "Time slot is already booked"
        ));
        assert_eq!(taken.patient_id, Some(original_patient));
    }

    #[test]
    fn booking_open_slot_is_allowed() {
        let open = slot(true, None);
        assert!(booking_decision(Some(&open)).is_ok());
    }
}
