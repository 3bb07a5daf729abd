// libs/appointment-cell/src/seed.rs
use chrono::Utc;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, DeliveryStatus, Medicine, Prescription};

pub const DEMO_PATIENT_ID: &str = "3";
pub const DEMO_DOCTOR_ID: &str = "2";

/// Demo records for local development: one booking awaiting the doctor and one
/// finished consultation whose medicines have not shipped yet.
pub fn demo_appointments() -> Vec<Appointment> {
    let now = Utc::now();
    let completed_id = Uuid::new_v4();

    let base = Appointment {
        id: Uuid::new_v4(),
        patient_id: DEMO_PATIENT_ID.to_string(),
        patient_name: "Rahul Kumar".to_string(),
        doctor_id: DEMO_DOCTOR_ID.to_string(),
        doctor_name: "Dr. Sharma".to_string(),
        specialty: "General Medicine".to_string(),
        date: "2024-01-20".to_string(),
        time: "10:00".to_string(),
        status: AppointmentStatus::Pending,
        notes: None,
        prescription: None,
        transcript: None,
        care_summary: None,
        created_at: now,
        updated_at: now,
    };

    let completed = Appointment {
        id: completed_id,
        date: "2024-01-15".to_string(),
        time: "14:00".to_string(),
        status: AppointmentStatus::Completed,
        notes: Some("Patient has mild fever and cold symptoms.".to_string()),
        transcript: Some(
            [
                "Doctor: How are you feeling today?",
                "Patient: I have had fever for 2 days and runny nose.",
                "Doctor: Let me check your temperature... It's 99.5°F. This seems like a viral infection.",
                "Doctor: I'll prescribe some medicines. Take rest and drink plenty of fluids.",
            ]
            .join("\n"),
        ),
        care_summary: Some(
            [
                "• Viral fever diagnosed",
                "• Take Paracetamol 500mg twice daily",
                "• Drink 8 glasses of water daily",
                "• Rest for 3 days",
                "• Follow up if fever persists",
            ]
            .join("\n"),
        ),
        prescription: Some(Prescription {
            id: "rx1".to_string(),
            appointment_id: completed_id,
            medicines: vec![
                Medicine::new("Paracetamol 500mg", "1 tablet", "Morning & Night", "5 days"),
                Medicine::new("Cetirizine 10mg", "1 tablet", "Night", "3 days"),
                Medicine::new("Vitamin C 500mg", "1 tablet", "Morning", "7 days"),
            ],
            instructions: "Take medicines after food. Rest well and stay hydrated.".to_string(),
            delivery_status: DeliveryStatus::Pending,
            delivery_partner_id: None,
            delivery_partner_name: None,
        }),
        ..base.clone()
    };

    vec![base, completed]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_data_is_consistent() {
        let appointments = demo_appointments();
        assert_eq!(appointments.len(), 2);
        assert_ne!(appointments[0].id, appointments[1].id);

        let completed = &appointments[1];
        let rx = completed.prescription.as_ref().unwrap();
        assert_eq!(rx.appointment_id, completed.id);
        assert_eq!(rx.medicines.len(), 3);
        assert_eq!(completed.status, AppointmentStatus::Completed);
    }
}
