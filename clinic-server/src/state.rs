use crate::config::ClinicConfig;
use crate::store::{AppointmentStore, DoctorStore, MemoryStore, PatientStore};
use keycloak_client::{AdminClient, AuthzClient, KeycloakError};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClinicConfig>,
    pub authz: Arc<AuthzClient>,
    pub admin: Arc<AdminClient>,
    pub patients: Arc<dyn PatientStore>,
    pub doctors: Arc<dyn DoctorStore>,
    pub appointments: Arc<dyn AppointmentStore>,
}

impl AppState {
    pub fn new(config: ClinicConfig) -> Result<Self, KeycloakError> {
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            authz: Arc::new(AuthzClient::new(config.keycloak.clone())?),
            admin: Arc::new(AdminClient::new(config.keycloak.clone())?),
            config: Arc::new(config),
            patients: store.clone(),
            doctors: store.clone(),
            appointments: store,
        })
    }

    /// Check if the identity provider is reachable
    pub async fn health_check(&self) -> bool {
        self.authz.health().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_state(config: ClinicConfig) -> AppState {
        AppState::new(config).expect("Failed to create test state")
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_data() {
        let config = ClinicConfig::default();
        let state = create_test_state(config);
        let state2 = state.clone();

        // After cloning, both instances should point to the same data
        assert_eq!(Arc::as_ptr(&state.config), Arc::as_ptr(&state2.config));
        assert_eq!(Arc::as_ptr(&state.authz), Arc::as_ptr(&state2.authz));
    }

    #[tokio::test]
    async fn test_stores_share_one_backend() {
        let state = create_test_state(ClinicConfig::default());
        assert_eq!(state.patients.count().await, 0);
        assert_eq!(state.doctors.count().await, 0);
        assert_eq!(state.appointments.count().await, 0);
    }
}
