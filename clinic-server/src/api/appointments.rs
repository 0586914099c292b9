use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::models::{Appointment, AppointmentStatus, Page, PageParams};
use crate::openapi::APPOINTMENTS_TAG;
use crate::registration::registration_number;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDateTime, Utc};
use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/api/v1/appointments/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

/// Payload for creating or updating an appointment
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct AppointmentRequest {
    pub appointment_date: NaiveDateTime,
    #[serde(default)]
    pub reason: Option<String>,
    pub patient_id: String,
    pub doctor_id: String,
}

/// An appointment, optionally enriched with the display names of the
/// participants (listing only)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AppointmentResponse {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    tag = APPOINTMENTS_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of appointments with participant names", body = Page<AppointmentResponse>),
        (status = 403, description = "Missing appointment:read permission")
    )
)]
async fn list_appointments(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<AppointmentResponse>>, ApiError> {
    ctx.require("PERMISSION_appointment:read")?;

    let total = state.appointments.count().await;
    let rows = state
        .appointments
        .find_page(params.offset(), params.size)
        .await;

    let mut items = Vec::with_capacity(rows.len());
    for appointment in rows {
        let patient_name = state
            .patients
            .find_by_id(&appointment.patient_id)
            .await
            .map(|p| format!("{} {}", p.first_name, p.last_name));
        let doctor_name = state
            .doctors
            .find_by_id(&appointment.doctor_id)
            .await
            .map(|d| format!("{} {}", d.first_name, d.last_name));
        items.push(AppointmentResponse {
            appointment,
            patient_name,
            doctor_name,
        });
    }

    Ok(Json(Page {
        items,
        page: params.page,
        size: params.size,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    tag = APPOINTMENTS_TAG,
    responses(
        (status = 200, description = "The appointment", body = AppointmentResponse),
        (status = 404, description = "Unknown appointment id")
    )
)]
async fn get_appointment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    ctx.require("PERMISSION_appointment:read")?;

    let appointment = state
        .appointments
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Appointment with id {id} not found")))?;
    Ok(Json(AppointmentResponse {
        appointment,
        patient_name: None,
        doctor_name: None,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    tag = APPOINTMENTS_TAG,
    request_body = AppointmentRequest,
    responses(
        (status = 201, description = "Appointment scheduled", body = AppointmentResponse),
        (status = 404, description = "Unknown patient or doctor id")
    )
)]
async fn create_appointment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    ctx.require("PERMISSION_appointment:create")?;

    if state
        .patients
        .find_by_id(&request.patient_id)
        .await
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Patient with id {} not found",
            request.patient_id
        )));
    }
    if state.doctors.find_by_id(&request.doctor_id).await.is_none() {
        return Err(ApiError::not_found(format!(
            "Doctor with id {} not found",
            request.doctor_id
        )));
    }

    let count = state.appointments.count().await;
    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        appointment_date: request.appointment_date,
        reason: request.reason.unwrap_or_default(),
        status: AppointmentStatus::Scheduled,
        patient_id: request.patient_id,
        doctor_id: request.doctor_id,
        appointment_num: registration_number("RDV", count),
        created_date: Utc::now().naive_utc(),
        updated_date: None,
        created_by: ctx.username().unwrap_or("unknown").to_string(),
    };
    info!("Appointment scheduled: {}", appointment.appointment_num);

    let appointment = state.appointments.save(appointment).await;
    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            appointment,
            patient_name: None,
            doctor_name: None,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    tag = APPOINTMENTS_TAG,
    request_body = AppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentResponse),
        (status = 404, description = "Unknown appointment id")
    )
)]
async fn update_appointment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(request): Json<AppointmentRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    ctx.require("PERMISSION_appointment:update")?;

    let mut appointment = state
        .appointments
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Appointment with id {id} not found")))?;

    appointment.appointment_date = request.appointment_date;
    appointment.reason = request.reason.unwrap_or_default();
    appointment.patient_id = request.patient_id;
    appointment.doctor_id = request.doctor_id;
    appointment.updated_date = Some(Utc::now().naive_utc());

    let appointment = state.appointments.save(appointment).await;
    Ok(Json(AppointmentResponse {
        appointment,
        patient_name: None,
        doctor_name: None,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    tag = APPOINTMENTS_TAG,
    responses(
        (status = 200, description = "Appointment deleted", body = bool),
        (status = 404, description = "Unknown appointment id")
    )
)]
async fn delete_appointment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<bool>, ApiError> {
    ctx.require("PERMISSION_appointment:delete")?;

    if !state.appointments.delete_by_id(&id).await {
        return Err(ApiError::not_found(format!(
            "Appointment with id {id} not found"
        )));
    }
    Ok(Json(true))
}
