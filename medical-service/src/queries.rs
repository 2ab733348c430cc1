//! Statements run against the medical bucket.
//!
//! Every statement selects one JSONB column named `row`. Client-supplied
//! values are always bound as parameters; only the bucket name is spliced
//! in, quoted as an identifier.

use shared::database::postgres::quote_ident;
use shared::QueryStatement;

use crate::models::{AppointmentParty, DocType};

/// Every document of one type, with its key merged in as `id`.
pub fn list_by_type(bucket: &str, doc_type: DocType) -> QueryStatement {
    let statement = format!(
        "SELECT jsonb_build_object('id', id) || content AS row \
         FROM {} WHERE content->>'type' = $1 ORDER BY id",
        quote_ident(bucket)
    );
    QueryStatement::parameterized(statement, [doc_type.as_str()])
}

/// Appointments booked for a patient or with a doctor.
pub fn appointments_for(bucket: &str, party: AppointmentParty, id: &str) -> QueryStatement {
    let statement = format!(
        "SELECT content AS row FROM {} \
         WHERE content->>'type' = 'appointment' AND content->>'{}' = $1 \
         ORDER BY content->'appointment'",
        quote_ident(bucket),
        party.field()
    );
    QueryStatement::parameterized(statement, [id])
}

const PATIENT_ROW: &str = "jsonb_build_object(\
    'information', patients.content->'information', \
    'timestamp', patients.content->'timestamp', \
    'type', patients.content->'type', \
    'id', patients.id)";

/// Patients listed in the doctor's `patients` array.
pub fn patients_assigned_to(bucket: &str, doctor_id: &str) -> QueryStatement {
    let table = quote_ident(bucket);
    let statement = format!(
        "SELECT {row} AS row FROM {table} AS doctors \
         JOIN {table} AS patients \
         ON COALESCE(doctors.content->'patients', '[]'::jsonb) ? patients.id \
         WHERE doctors.content->>'type' = 'doctor' AND doctors.id = $1 \
         ORDER BY patients.id",
        row = PATIENT_ROW,
        table = table
    );
    QueryStatement::parameterized(statement, [doctor_id])
}

/// Patients carrying at least one note written by the doctor.
///
/// A `notes` value that is not an array counts as no notes.
pub fn patients_serviced_by(bucket: &str, doctor_id: &str) -> QueryStatement {
    let statement = format!(
        "SELECT {row} AS row FROM {table} AS patients \
         WHERE patients.content->>'type' = 'patient' \
         AND EXISTS (\
             SELECT 1 FROM jsonb_array_elements(\
                 CASE WHEN jsonb_typeof(patients.content->'notes') = 'array' \
                 THEN patients.content->'notes' ELSE '[]'::jsonb END) AS note \
             WHERE note->>'doctor' = $1) \
         ORDER BY patients.id",
        row = PATIENT_ROW,
        table = quote_ident(bucket)
    );
    QueryStatement::parameterized(statement, [doctor_id])
}

/// Delete one appointment, returning what was removed.
pub fn delete_appointment(bucket: &str, appointment_id: &str) -> QueryStatement {
    let statement = format!(
        "DELETE FROM {} WHERE content->>'type' = 'appointment' AND id = $1 \
         RETURNING jsonb_build_object('id', id) || content AS row",
        quote_ident(bucket)
    );
    QueryStatement::parameterized(statement, [appointment_id])
}
