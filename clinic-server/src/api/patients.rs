use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::models::{Gender, Page, PageParams, Patient};
use crate::openapi::PATIENTS_TAG;
use crate::registration::registration_number;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/patients", get(list_patients).post(create_patient))
        .route(
            "/api/v1/patients/{id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

/// Payload for creating or updating a patient
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct PatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub place_of_birth: String,
    pub gender: Gender,
    pub phone_number: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub person_to_notify_name: Option<String>,
    #[serde(default)]
    pub person_to_notify_phone_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/patients",
    tag = PATIENTS_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of patients", body = Page<Patient>),
        (status = 403, description = "Missing patient:read permission")
    )
)]
async fn list_patients(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Patient>>, ApiError> {
    ctx.require("PERMISSION_patient:read")?;

    let total = state.patients.count().await;
    let items = state.patients.find_page(params.offset(), params.size).await;
    Ok(Json(Page {
        items,
        page: params.page,
        size: params.size,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    tag = PATIENTS_TAG,
    responses(
        (status = 200, description = "The patient", body = Patient),
        (status = 404, description = "Unknown patient id")
    )
)]
async fn get_patient(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    ctx.require("PERMISSION_patient:read")?;

    let patient = state
        .patients
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Patient with id {id} not found")))?;
    Ok(Json(patient))
}

#[utoipa::path(
    post,
    path = "/api/v1/patients",
    tag = PATIENTS_TAG,
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 409, description = "Phone number already registered")
    )
)]
async fn create_patient(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<PatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    ctx.require("PERMISSION_patient:create")?;

    if state
        .patients
        .find_by_phone_number(&request.phone_number)
        .await
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Patient with phone number {} already exists",
            request.phone_number
        )));
    }

    let count = state.patients.count().await;
    let patient = Patient {
        id: Uuid::new_v4().to_string(),
        first_name: request.first_name,
        last_name: request.last_name,
        birth_date: request.birth_date,
        place_of_birth: request.place_of_birth,
        gender: request.gender,
        phone_number: request.phone_number,
        address: request.address,
        registration_number: registration_number("PAT", count),
        person_to_notify_name: request.person_to_notify_name,
        person_to_notify_phone_number: request.person_to_notify_phone_number,
    };
    info!("Patient created: {}", patient.registration_number);

    let patient = state.patients.save(patient).await;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    put,
    path = "/api/v1/patients/{id}",
    tag = PATIENTS_TAG,
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 404, description = "Unknown patient id")
    )
)]
async fn update_patient(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(request): Json<PatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    ctx.require("PERMISSION_patient:update")?;

    let mut patient = state
        .patients
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Patient with id {id} not found")))?;

    // The registration number is immutable once assigned.
    patient.first_name = request.first_name;
    patient.last_name = request.last_name;
    patient.birth_date = request.birth_date;
    patient.place_of_birth = request.place_of_birth;
    patient.gender = request.gender;
    patient.phone_number = request.phone_number;
    patient.address = request.address;
    patient.person_to_notify_name = request.person_to_notify_name;
    patient.person_to_notify_phone_number = request.person_to_notify_phone_number;

    let patient = state.patients.save(patient).await;
    Ok(Json(patient))
}

#[utoipa::path(
    delete,
    path = "/api/v1/patients/{id}",
    tag = PATIENTS_TAG,
    responses(
        (status = 200, description = "Patient deleted", body = bool),
        (status = 404, description = "Unknown patient id")
    )
)]
async fn delete_patient(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<bool>, ApiError> {
    ctx.require("PERMISSION_patient:delete")?;

    if !state.patients.delete_by_id(&id).await {
        return Err(ApiError::not_found(format!(
            "Patient with id {id} not found"
        )));
    }
    Ok(Json(true))
}
