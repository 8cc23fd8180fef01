use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::appointment::AppointmentView;

/// One medicine line on a prescription.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicineLineItem {
    pub medicine_id: ObjectId,
    pub name: String,
    pub quantity: u32,
}

/// Doctor remarks plus medicine lines, one-to-one with a booked
/// appointment. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub appointment_id: ObjectId,
    pub remarks: String,
    pub medicines: Vec<MedicineLineItem>,
    pub created_at: DateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub medicine_id: String,
    pub name: String,
    pub quantity: u32,
}

impl From<MedicineLineItem> for LineItemView {
    fn from(item: MedicineLineItem) -> Self {
        Self {
            medicine_id: item.medicine_id.to_hex(),
            name: item.name,
            quantity: item.quantity,
        }
    }
}

/// Prescription joined with its appointment for list views; the
/// appointment carries the date/time pair the list is ordered by.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionView {
    pub id: String,
    pub remarks: String,
    pub medicines: Vec<LineItemView>,
    pub appointment: AppointmentView,
}
