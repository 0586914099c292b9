use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const PATIENTS_TAG: &str = "Patients API";
pub(crate) const DOCTORS_TAG: &str = "Doctors API";
pub(crate) const APPOINTMENTS_TAG: &str = "Appointments API";
pub(crate) const USERS_TAG: &str = "Users API";
pub(crate) const ROLES_TAG: &str = "Roles API";
pub(crate) const PERMISSIONS_TAG: &str = "Permissions API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = PATIENTS_TAG, description = "Patient administration"),
        (name = DOCTORS_TAG, description = "Doctor administration"),
        (name = APPOINTMENTS_TAG, description = "Appointment scheduling"),
        (name = USERS_TAG, description = "Identity provider user accounts"),
        (name = ROLES_TAG, description = "Identity provider roles"),
        (name = PERMISSIONS_TAG, description = "Identity provider permissions"),
    ),
    info(
        title = "Clinic Administration API",
        description = "Clinical administration backend secured by UMA2 permissions",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;
