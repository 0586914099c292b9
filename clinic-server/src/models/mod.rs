use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// A registered patient record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub place_of_birth: String,
    pub gender: Gender,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub registration_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_to_notify_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_to_notify_phone_number: Option<String>,
}

/// A practicing doctor record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Doctor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub specialty: String,
    pub registration_number: String,
}

/// A scheduled appointment between a patient and a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: String,
    pub appointment_date: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_num: String,
    pub created_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<NaiveDateTime>,
    pub created_by: String,
}

/// Offset+limit page envelope returned by every listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total: u64,
}

/// Common pagination query parameters (page number and page size).
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Zero-based page number (default: 0)
    #[serde(default)]
    pub page: usize,

    /// Page size (default: 10)
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    10
}

impl PageParams {
    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_offset() {
        let params = PageParams { page: 3, size: 25 };
        assert_eq!(params.offset(), 75);
        assert_eq!(PageParams::default().offset(), 0);
    }

    #[test]
    fn test_gender_wire_format() {
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"MALE\"");
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Scheduled).unwrap(),
            "\"SCHEDULED\""
        );
    }
}
