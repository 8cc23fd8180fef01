//! Medicine catalog.
//!
//! Read access is open to any signed-in user; writes are admin-only.
//! Create and update run the same full field validation, so a partial
//! update cannot leave a catalog entry half-filled.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use serde::Deserialize;
use serde_json::{json, Value};

use mediflow_validation::{validate_medicine, MedicineFields};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::models::medicine::{Medicine, MedicineResponse};
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/medicines", get(list_medicines))
        .route("/medicines", post(create_medicine))
        .route("/medicines/{id}", get(get_medicine))
        .route("/medicines/{id}", put(update_medicine))
        .route("/medicines/{id}", delete(delete_medicine))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MedicineQuery {
    pub name: Option<String>,
}

fn catalog_body(medicines: Vec<Medicine>) -> Value {
    let medicines: Vec<MedicineResponse> = medicines.into_iter().map(Into::into).collect();
    json!({ "message": "success", "medicines": medicines })
}

async fn list_medicines(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<MedicineQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut filter = Document::new();
    if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        filter.insert("name", doc! { "$regex": name, "$options": "i" });
    }
    let medicines: Vec<Medicine> = state
        .db
        .medicines()
        .find(filter)
        .await?
        .try_collect()
        .await?;
    Ok(Json(catalog_body(medicines)))
}

async fn get_medicine(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "medicine")?;
    let medicine = state
        .db
        .medicines()
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;
    Ok(Json(
        json!({ "message": "success", "medicine": MedicineResponse::from(medicine) }),
    ))
}

fn medicine_from_fields(fields: &MedicineFields) -> Result<Medicine, ApiError> {
    let result = validate_medicine(fields);
    if !result.is_valid() {
        return Err(ApiError::validation(result));
    }
    // Validation guarantees presence.
    Ok(Medicine {
        id: None,
        name: fields.name.as_deref().unwrap_or_default().trim().to_string(),
        company: fields.company.as_deref().unwrap_or_default().trim().to_string(),
        description: fields
            .description
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
        price: fields.price.unwrap_or_default(),
    })
}

async fn create_medicine(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(fields): Json<MedicineFields>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let medicine = medicine_from_fields(&fields)?;
    state.db.medicines().insert_one(&medicine).await?;
    tracing::info!(name = %medicine.name, "medicine added to catalog");
    Ok((StatusCode::CREATED, Json(json!({ "message": "success" }))))
}

/// Full-document replacement; unlike create it responds 200, nothing
/// new exists afterwards.
async fn update_medicine(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(fields): Json<MedicineFields>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "medicine")?;
    let medicine = medicine_from_fields(&fields)?;
    let result = state
        .db
        .medicines()
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": &medicine.name,
                "company": &medicine.company,
                "description": &medicine.description,
                "price": medicine.price,
            } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Medicine not found".to_string()));
    }
    Ok(Json(json!({ "message": "success" })))
}

async fn delete_medicine(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_object_id(&id, "medicine")?;
    let result = state.db.medicines().delete_one(doc! { "_id": id }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Medicine not found".to_string()));
    }
    Ok(Json(
        json!({ "message": "success", "deletedCount": result.deleted_count }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn catalog_listing_is_enveloped() {
        let body = catalog_body(vec![Medicine {
            id: Some(ObjectId::new()),
            name: "Paracetamol".to_string(),
            company: "Acme Pharma".to_string(),
            description: "Analgesic".to_string(),
            price: 2.5,
        }]);
        assert_eq!(body["message"], "success");
        assert_eq!(body["medicines"][0]["name"], "Paracetamol");
        assert_eq!(body["medicines"][0]["price"], 2.5);
    }

    #[test]
    fn empty_catalog_still_carries_the_envelope() {
        let body = catalog_body(Vec::new());
        assert_eq!(body["message"], "success");
        assert!(body["medicines"].as_array().unwrap().is_empty());
    }

    #[test]
    fn plain_success_body_responds_200() {
        let response = Json(json!({ "message": "success" })).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
