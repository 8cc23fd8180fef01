use chrono::NaiveDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::PersonBrief;
use crate::schedule;

/// One doctor-time-slot. Created available; booking assigns a patient
/// and flips the occupancy flag, exactly once.
///
/// Invariant: a booked slot carries a patient reference, an available
/// slot does not.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub doctor_id: ObjectId,
    /// Calendar date, stored as `YYYY-MM-DD`.
    pub appointment_date: String,
    /// Time of day, stored as submitted (`10:00 AM` or `14:30`).
    pub appointment_time: String,
    pub is_time_slot_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<ObjectId>,
}

impl Appointment {
    /// Composite ordering key for this slot; see [`schedule::slot_instant`].
    pub fn instant(&self) -> Option<NaiveDateTime> {
        schedule::slot_instant(&self.appointment_date, &self.appointment_time)
    }
}

/// Slot as returned by the API, with joined doctor/patient briefs for
/// table views.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    pub is_time_slot_available: bool,
    pub doctor: Option<PersonBrief>,
    pub patient: Option<PersonBrief>,
}

impl AppointmentView {
    pub fn new(
        appointment: Appointment,
        doctor: Option<PersonBrief>,
        patient: Option<PersonBrief>,
    ) -> Self {
        Self {
            id: appointment.id.map(|id| id.to_hex()).unwrap_or_default(),
            doctor_id: appointment.doctor_id.to_hex(),
            patient_id: appointment.patient_id.map(|id| id.to_hex()),
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            is_time_slot_available: appointment.is_time_slot_available,
            doctor,
            patient,
        }
    }
}
