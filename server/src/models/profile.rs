use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Doctor profile, one-to-one with a [`super::user::User`] via
/// `user_id`. Names are denormalized from the user at sign-up so list
/// views need only a single-level join.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Patient profile, one-to-one with a user via `user_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

impl Doctor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Patient {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorResponse {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
}

impl From<Doctor> for DoctorResponse {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: doctor.user_id.to_hex(),
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            email: doctor.email,
            department: doctor.department,
            phone: doctor.phone,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: patient.user_id.to_hex(),
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            address: patient.address,
            phone: patient.phone,
            date_of_birth: patient.date_of_birth,
        }
    }
}
