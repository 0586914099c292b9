use crate::models::{Appointment, Doctor, Patient};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryStore;

/// Persistence boundary for patient records.
///
/// `save` has upsert semantics keyed on the record id; pagination is plain
/// offset+limit over insertion order.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<Patient>;
    async fn find_by_phone_number(&self, phone_number: &str) -> Option<Patient>;
    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Patient>;
    async fn count(&self) -> u64;
    async fn save(&self, patient: Patient) -> Patient;
    async fn delete_by_id(&self, id: &str) -> bool;
}

/// Persistence boundary for doctor records.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<Doctor>;
    async fn find_by_email(&self, email: &str) -> Option<Doctor>;
    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Doctor>;
    async fn count(&self) -> u64;
    async fn save(&self, doctor: Doctor) -> Doctor;
    async fn delete_by_id(&self, id: &str) -> bool;
}

/// Persistence boundary for appointment records.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<Appointment>;
    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Appointment>;
    async fn count(&self) -> u64;
    async fn save(&self, appointment: Appointment) -> Appointment;
    async fn delete_by_id(&self, id: &str) -> bool;
}
