use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` discriminator of the documents in the medical bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Patient,
    Doctor,
    Appointment,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Patient => "patient",
            DocType::Doctor => "doctor",
            DocType::Appointment => "appointment",
        }
    }
}

/// Which side of an appointment a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentParty {
    Patient,
    Doctor,
}

impl AppointmentParty {
    pub fn field(&self) -> &'static str {
        match self {
            AppointmentParty::Patient => "patient",
            AppointmentParty::Doctor => "doctor",
        }
    }
}

/// Free-form JSON object received from a client.
pub type Payload = Map<String, Value>;

/// Adds a patient to a doctor's `patients` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientAssignment {
    pub doctor: String,
    pub patient: String,
}

/// Full-text search over patient notes and names.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSearch {
    pub search: String,
    pub fuzziness: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorPatientsQuery {
    #[serde(default)]
    pub serviced: bool,
}

/// Error body returned for failed store operations.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}

/// Error body returned for rejected requests.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_type_matches_serialized_form() {
        for doc_type in [DocType::Patient, DocType::Doctor, DocType::Appointment] {
            assert_eq!(
                serde_json::to_value(doc_type).unwrap(),
                json!(doc_type.as_str())
            );
        }
    }

    #[test]
    fn test_serviced_defaults_to_false() {
        let query: DoctorPatientsQuery = serde_json::from_value(json!({})).unwrap();
        assert!(!query.serviced);
    }
}
