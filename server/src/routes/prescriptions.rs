//! Prescriptions and derived invoices.
//!
//! A prescription is written by a doctor against a booked appointment.
//! The invoice for a prescription is never stored: the amount is the
//! sum of line quantity times catalog price at read time, so a price
//! change is reflected in later invoice reads.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthUser, DoctorAuth};
use crate::error::ApiError;
use crate::models::appointment::Appointment;
use crate::models::prescription::{LineItemView, MedicineLineItem, Prescription, PrescriptionView};
use crate::routes::appointments::appointment_views;
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prescription", post(create_prescription))
        .route("/prescriptions", post(list_prescriptions))
        .route("/prescription/invoice/{id}", get(invoice))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionLineRequest {
    pub medicine_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub appointment_id: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub medicines: Vec<PrescriptionLineRequest>,
}

async fn create_prescription(
    State(state): State<AppState>,
    _auth: DoctorAuth,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let appointment_id = parse_object_id(&request.appointment_id, "appointment")?;
    let appointment = state
        .db
        .appointments()
        .find_one(doc! { "_id": appointment_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;
    if appointment.is_time_slot_available {
        return Err(ApiError::Conflict(
            "Appointment has not been booked".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(request.medicines.len());
    for line in &request.medicines {
        if line.quantity == 0 {
            return Err(ApiError::invalid("Medicine quantity must be positive"));
        }
        let medicine_id = parse_object_id(&line.medicine_id, "medicine")?;
        let medicine = state
            .db
            .medicines()
            .find_one(doc! { "_id": medicine_id })
            .await?
            .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;
        lines.push(MedicineLineItem {
            medicine_id,
            name: medicine.name,
            quantity: line.quantity,
        });
    }

    let prescription = Prescription {
        id: None,
        appointment_id,
        remarks: request.remarks.trim().to_string(),
        medicines: lines,
        created_at: DateTime::now(),
    };
    let inserted = state.db.prescriptions().insert_one(&prescription).await?;
    tracing::info!(
        appointment = %appointment_id,
        prescription = ?inserted.inserted_id,
        "prescription created"
    );
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPrescriptionsRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

/// List prescriptions, most recent appointment first.
///
/// Filters select the appointments first, then the prescriptions
/// written against them, so a patient filter returns exactly the
/// prescriptions from that patient's visits.
async fn list_prescriptions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<ListPrescriptionsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut appointment_filter = Document::new();
    if let Some(patient_id) = &request.patient_id {
        appointment_filter.insert("patient_id", parse_object_id(patient_id, "patient")?);
    }
    if let Some(doctor_id) = &request.doctor_id {
        appointment_filter.insert("doctor_id", parse_object_id(doctor_id, "doctor")?);
    }

    let appointments: Vec<Appointment> = state
        .db
        .appointments()
        .find(appointment_filter)
        .await?
        .try_collect()
        .await?;
    let appointment_ids: Vec<ObjectId> = appointments.iter().filter_map(|a| a.id).collect();

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

    let views = appointment_views(&state, appointments).await?;
    let by_appointment: HashMap<String, _> = views
        .into_iter()
        .map(|view| (view.id.clone(), view))
        .collect();

    let mut out = Vec::with_capacity(prescriptions.len());
    for prescription in prescriptions {
        let Some(appointment) = by_appointment
            .get(&prescription.appointment_id.to_hex())
            .cloned()
        else {
            continue;
        };
        out.push(PrescriptionView {
            id: prescription.id.map(|id| id.to_hex()).unwrap_or_default(),
            remarks: prescription.remarks,
            medicines: prescription
                .medicines
                .into_iter()
                .map(LineItemView::from)
                .collect(),
            appointment,
        });
    }
    crate::schedule::sort_most_recent_first(&mut out, |view| {
        crate::schedule::slot_instant(
            &view.appointment.appointment_date,
            &view.appointment.appointment_time,
        )
    });
    Ok(Json(json!({ "message": "success", "prescriptions": out })))
}

/// Invoice amount for one prescription. Line items whose medicine has
/// left the catalog contribute nothing rather than failing the read.
async fn invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "prescription")?;
    let prescription = state
        .db
        .prescriptions()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Prescription not found".to_string()))?;

    let medicine_ids: Vec<ObjectId> = prescription
        .medicines
        .iter()
        .map(|line| line.medicine_id)
        .collect();
    let mut prices: HashMap<ObjectId, f64> = HashMap::new();
    if !medicine_ids.is_empty() {
        let medicines = state
            .db
            .medicines()
            .find(doc! { "_id": { "$in": medicine_ids } })
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        for medicine in medicines {
            if let Some(medicine_id) = medicine.id {
                prices.insert(medicine_id, medicine.price);
            }
        }
    }

    let amount: f64 = prescription
        .medicines
        .iter()
        .filter_map(|line| {
            prices
                .get(&line.medicine_id)
                .map(|price| price * f64::from(line.quantity))
        })
        .sum();
    Ok(Json(json!({
        "message": "success",
        "id": id.to_hex(),
        "amount": amount,
    })))
}
