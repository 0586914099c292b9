use crate::models::{Appointment, Doctor, Patient};
use crate::store::{AppointmentStore, DoctorStore, PatientStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory backend for all three stores.
///
/// Rows are kept in insertion order so paging is deterministic. One instance
/// is shared behind `Arc` by the whole application.
#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<Vec<Patient>>,
    doctors: RwLock<Vec<Doctor>>,
    appointments: RwLock<Vec<Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

async fn find_row<T: Clone>(rows: &RwLock<Vec<T>>, matches: impl Fn(&T) -> bool) -> Option<T> {
    rows.read().await.iter().find(|row| matches(row)).cloned()
}

async fn page_rows<T: Clone>(rows: &RwLock<Vec<T>>, offset: usize, limit: usize) -> Vec<T> {
    rows.read()
        .await
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

/// Replaces the row with the same key or appends a new one.
async fn save_row<T: Clone>(rows: &RwLock<Vec<T>>, row: T, same_id: impl Fn(&T) -> bool) -> T {
    let mut rows = rows.write().await;
    match rows.iter_mut().find(|existing| same_id(existing)) {
        Some(existing) => *existing = row.clone(),
        None => rows.push(row.clone()),
    }
    row
}

async fn delete_row<T>(rows: &RwLock<Vec<T>>, matches: impl Fn(&T) -> bool) -> bool {
    let mut rows = rows.write().await;
    let before = rows.len();
    rows.retain(|row| !matches(row));
    rows.len() < before
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Option<Patient> {
        find_row(&self.patients, |p| p.id == id).await
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> Option<Patient> {
        find_row(&self.patients, |p| p.phone_number == phone_number).await
    }

    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Patient> {
        page_rows(&self.patients, offset, limit).await
    }

    async fn count(&self) -> u64 {
        self.patients.read().await.len() as u64
    }

    async fn save(&self, patient: Patient) -> Patient {
        let id = patient.id.clone();
        save_row(&self.patients, patient, |p| p.id == id).await
    }

    async fn delete_by_id(&self, id: &str) -> bool {
        delete_row(&self.patients, |p| p.id == id).await
    }
}

#[async_trait]
impl DoctorStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Option<Doctor> {
        find_row(&self.doctors, |d| d.id == id).await
    }

    async fn find_by_email(&self, email: &str) -> Option<Doctor> {
        find_row(&self.doctors, |d| d.email == email).await
    }

    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Doctor> {
        page_rows(&self.doctors, offset, limit).await
    }

    async fn count(&self) -> u64 {
        self.doctors.read().await.len() as u64
    }

    async fn save(&self, doctor: Doctor) -> Doctor {
        let id = doctor.id.clone();
        save_row(&self.doctors, doctor, |d| d.id == id).await
    }

    async fn delete_by_id(&self, id: &str) -> bool {
        delete_row(&self.doctors, |d| d.id == id).await
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Option<Appointment> {
        find_row(&self.appointments, |a| a.id == id).await
    }

    async fn find_page(&self, offset: usize, limit: usize) -> Vec<Appointment> {
        page_rows(&self.appointments, offset, limit).await
    }

    async fn count(&self) -> u64 {
        self.appointments.read().await.len() as u64
    }

    async fn save(&self, appointment: Appointment) -> Appointment {
        let id = appointment.id.clone();
        save_row(&self.appointments, appointment, |a| a.id == id).await
    }

    async fn delete_by_id(&self, id: &str) -> bool {
        delete_row(&self.appointments, |a| a.id == id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;

    fn patient(id: &str, phone: &str) -> Patient {
        Patient {
            id: id.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            place_of_birth: "Lyon".to_string(),
            gender: Gender::Female,
            phone_number: phone.to_string(),
            address: None,
            registration_number: format!("PAT-{id}"),
            person_to_notify_name: None,
            person_to_notify_phone_number: None,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = MemoryStore::new();
        PatientStore::save(&store, patient("p1", "0600000001")).await;

        let found = PatientStore::find_by_id(&store, "p1").await;
        assert!(found.is_some());
        assert!(PatientStore::find_by_id(&store, "missing").await.is_none());
        assert!(store.find_by_phone_number("0600000001").await.is_some());
        assert_eq!(PatientStore::count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_row() {
        let store = MemoryStore::new();
        PatientStore::save(&store, patient("p1", "0600000001")).await;

        let mut updated = patient("p1", "0600000099");
        updated.first_name = "Janet".to_string();
        PatientStore::save(&store, updated).await;

        assert_eq!(PatientStore::count(&store).await, 1);
        let found = PatientStore::find_by_id(&store, "p1").await.unwrap();
        assert_eq!(found.first_name, "Janet");
        assert_eq!(found.phone_number, "0600000099");
    }

    #[tokio::test]
    async fn test_pagination_follows_insertion_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            PatientStore::save(&store, patient(&format!("p{i}"), &format!("06000000{i}"))).await;
        }

        let page = PatientStore::find_page(&store, 2, 2).await;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "p2");
        assert_eq!(page[1].id, "p3");

        let tail = PatientStore::find_page(&store, 4, 10).await;
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, "p4");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        PatientStore::save(&store, patient("p1", "0600000001")).await;

        assert!(PatientStore::delete_by_id(&store, "p1").await);
        assert!(!PatientStore::delete_by_id(&store, "p1").await);
        assert_eq!(PatientStore::count(&store).await, 0);
    }
}
