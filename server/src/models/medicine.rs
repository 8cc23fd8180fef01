use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Catalog item, independently CRUD-managed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Medicine {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub company: String,
    pub description: String,
    pub price: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineResponse {
    pub id: String,
    pub name: String,
    pub company: String,
    pub description: String,
    pub price: f64,
}

impl From<Medicine> for MedicineResponse {
    fn from(medicine: Medicine) -> Self {
        Self {
            id: medicine.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: medicine.name,
            company: medicine.company,
            description: medicine.description,
            price: medicine.price,
        }
    }
}
