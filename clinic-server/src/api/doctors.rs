use crate::auth::AuthContext;
use crate::errors::ApiError;
use crate::models::{Doctor, Page, PageParams};
use crate::openapi::DOCTORS_TAG;
use crate::registration::registration_number;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/api/v1/doctors/{id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
}

/// Payload for creating or updating a doctor
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub(crate) struct DoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub specialty: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/doctors",
    tag = DOCTORS_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "One page of doctors", body = Page<Doctor>),
        (status = 403, description = "Missing doctor:read permission")
    )
)]
async fn list_doctors(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Doctor>>, ApiError> {
    ctx.require("PERMISSION_doctor:read")?;

    let total = state.doctors.count().await;
    let items = state.doctors.find_page(params.offset(), params.size).await;
    Ok(Json(Page {
        items,
        page: params.page,
        size: params.size,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/doctors/{id}",
    tag = DOCTORS_TAG,
    responses(
        (status = 200, description = "The doctor", body = Doctor),
        (status = 404, description = "Unknown doctor id")
    )
)]
async fn get_doctor(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    ctx.require("PERMISSION_doctor:read")?;

    let doctor = state
        .doctors
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Doctor with id {id} not found")))?;
    Ok(Json(doctor))
}

#[utoipa::path(
    post,
    path = "/api/v1/doctors",
    tag = DOCTORS_TAG,
    request_body = DoctorRequest,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 409, description = "Email already registered")
    )
)]
async fn create_doctor(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(request): Json<DoctorRequest>,
) -> Result<(StatusCode, Json<Doctor>), ApiError> {
    ctx.require("PERMISSION_doctor:create")?;

    if state.doctors.find_by_email(&request.email).await.is_some() {
        return Err(ApiError::conflict(format!(
            "Doctor with email {} already exists",
            request.email
        )));
    }

    let count = state.doctors.count().await;
    let doctor = Doctor {
        id: Uuid::new_v4().to_string(),
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        telephone: request.telephone,
        specialty: request.specialty,
        registration_number: registration_number("DOC", count),
    };
    info!("Doctor created: {}", doctor.registration_number);

    let doctor = state.doctors.save(doctor).await;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[utoipa::path(
    put,
    path = "/api/v1/doctors/{id}",
    tag = DOCTORS_TAG,
    request_body = DoctorRequest,
    responses(
        (status = 200, description = "Doctor updated", body = Doctor),
        (status = 404, description = "Unknown doctor id")
    )
)]
async fn update_doctor(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(request): Json<DoctorRequest>,
) -> Result<Json<Doctor>, ApiError> {
    ctx.require("PERMISSION_doctor:update")?;

    let mut doctor = state
        .doctors
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Doctor with id {id} not found")))?;

    doctor.first_name = request.first_name;
    doctor.last_name = request.last_name;
    doctor.email = request.email;
    doctor.telephone = request.telephone;
    doctor.specialty = request.specialty;

    let doctor = state.doctors.save(doctor).await;
    Ok(Json(doctor))
}

#[utoipa::path(
    delete,
    path = "/api/v1/doctors/{id}",
    tag = DOCTORS_TAG,
    responses(
        (status = 200, description = "Doctor deleted", body = bool),
        (status = 404, description = "Unknown doctor id")
    )
)]
async fn delete_doctor(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<bool>, ApiError> {
    ctx.require("PERMISSION_doctor:delete")?;

    if !state.doctors.delete_by_id(&id).await {
        return Err(ApiError::not_found(format!("Doctor with id {id} not found")));
    }
    Ok(Json(true))
}

#[cfg(test)]
mod tests {
    use crate::models::Doctor;
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    const FULL_ACCESS: &[&str] = &[
        "doctor:read",
        "doctor:create",
        "doctor:update",
        "doctor:delete",
    ];

    fn doctor_request(email: &str) -> serde_json::Value {
        json!({
            "first_name": "Gregory",
            "last_name": "House",
            "email": email,
            "telephone": "0611111111",
            "specialty": "Diagnostics"
        })
    }

    #[tokio::test]
    async fn test_doctor_crud_round_trip() {
        let fixture = TestFixture::new().await;
        fixture.mock_exchange_with_permissions(FULL_ACCESS).await;

        let response = fixture
            .post("/api/v1/doctors", &doctor_request("house@clinic.io"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let doctor = response.json_as::<Doctor>();
        assert_eq!(doctor.registration_number, "DOC-000001");

        let mut update = doctor_request("house@clinic.io");
        update["specialty"] = json!("Nephrology");
        let updated = fixture
            .put(format!("/api/v1/doctors/{}", doctor.id), &update)
            .await;
        updated.assert_ok();
        assert_eq!(updated.json_as::<Doctor>().specialty, "Nephrology");

        let listed = fixture.get("/api/v1/doctors").await;
        listed.assert_ok();
        assert_eq!(listed.json["total"], 1);

        fixture
            .delete(format!("/api/v1/doctors/{}", doctor.id))
            .await
            .assert_ok();
        fixture
            .get(format!("/api/v1/doctors/{}", doctor.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_doctor_rejects_duplicate_email() {
        let fixture = TestFixture::new().await;
        fixture.mock_exchange_with_permissions(FULL_ACCESS).await;

        fixture
            .post("/api/v1/doctors", &doctor_request("house@clinic.io"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = fixture
            .post("/api/v1/doctors", &doctor_request("house@clinic.io"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json["detail"],
            "Doctor with email house@clinic.io already exists"
        );
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden() {
        let fixture = TestFixture::new().await;
        fixture
            .mock_exchange_with_permissions(&["patient:read"])
            .await;

        fixture
            .get("/api/v1/doctors")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
