// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub prescription: Option<Prescription>,
    pub transcript: Option<String>,
    pub care_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn has_prescription(&self) -> bool {
        self.prescription.is_some()
    }

    /// True for the patient or doctor named on the appointment.
    pub fn involves(&self, user_id: &str) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }

    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.prescription.as_ref().map(|rx| rx.delivery_status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and cancelled appointments never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Active appointments hold their slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// PRESCRIPTION MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub appointment_id: Uuid,
    pub medicines: Vec<Medicine>,
    pub instructions: String,
    pub delivery_status: DeliveryStatus,
    pub delivery_partner_id: Option<String>,
    pub delivery_partner_name: Option<String>,
}

impl Prescription {
    pub fn is_delivered(&self) -> bool {
        self.delivery_status == DeliveryStatus::Delivered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub timing: String,
    pub duration: String,
}

impl Medicine {
    pub fn new(name: &str, dosage: &str, timing: &str, duration: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: dosage.to_string(),
            timing: timing.to_string(),
            duration: duration.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.name, &self.dosage, &self.timing, &self.duration]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    OutForDelivery,
    Delivered,
}

impl DeliveryStatus {
    /// Position on the order tracker, `0` for pending through `3` for delivered.
    pub fn step(&self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::Accepted => 1,
            DeliveryStatus::OutForDelivery => 2,
            DeliveryStatus::Delivered => 3,
        }
    }

    pub fn next(&self) -> Option<DeliveryStatus> {
        match self {
            DeliveryStatus::Pending => Some(DeliveryStatus::Accepted),
            DeliveryStatus::Accepted => Some(DeliveryStatus::OutForDelivery),
            DeliveryStatus::OutForDelivery => Some(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered => None,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Accepted => write!(f, "accepted"),
            DeliveryStatus::OutForDelivery => write!(f, "out_for_delivery"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Everything a booking carries except the id and status the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub care_summary: Option<String>,
}

/// Partial update of an appointment. Every field that is `Some` replaces the
/// stored value; identity and slot fields are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentPatch {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub prescription: Option<PrescriptionDraft>,
    pub transcript: Option<String>,
    pub care_summary: Option<String>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::default()
        }
    }

    /// Completes the consultation and issues a prescription in one update.
    pub fn complete_with(prescription: PrescriptionDraft) -> Self {
        Self {
            status: Some(AppointmentStatus::Completed),
            prescription: Some(prescription),
            ..Self::default()
        }
    }

    pub fn with_care_summary(mut self, summary: impl Into<String>) -> Self {
        self.care_summary = Some(summary.into());
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.notes.is_none()
            && self.prescription.is_none()
            && self.transcript.is_none()
            && self.care_summary.is_none()
    }
}

/// Prescription as written by the doctor. The store stamps the owning
/// appointment and the initial delivery state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub medicines: Vec<Medicine>,
    pub instructions: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPatch {
    pub delivery_status: Option<DeliveryStatus>,
    pub delivery_partner_id: Option<String>,
    pub delivery_partner_name: Option<String>,
}

impl DeliveryPatch {
    pub fn status(status: DeliveryStatus) -> Self {
        Self {
            delivery_status: Some(status),
            ..Self::default()
        }
    }

    pub fn accepted_by(partner_id: &str, partner_name: &str) -> Self {
        Self {
            delivery_status: Some(DeliveryStatus::Accepted),
            delivery_partner_id: Some(partner_id.to_string()),
            delivery_partner_name: Some(partner_name.to_string()),
        }
    }
}

// ==============================================================================
// TRANSITION AND SUMMARY MODELS
// ==============================================================================

/// Snapshot pair produced by a mutation, used to derive notices.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub previous: T,
    pub current: T,
}

impl<T> Transition<T> {
    pub fn new(previous: T, current: T) -> Self {
        Self { previous, current }
    }

    /// True when `field` went from something else to `value`.
    pub fn changed_to<V: PartialEq>(&self, field: impl Fn(&T) -> V, value: V) -> bool {
        field(&self.current) == value && field(&self.previous) != value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub pending_appointments: usize,
    pub confirmed_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub prescriptions_issued: usize,
    pub deliveries_outstanding: usize,
    pub deliveries_completed: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(Uuid),

    #[error("Prescription {0} not found")]
    PrescriptionNotFound(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Delivery cannot move from {from} to {to}")]
    InvalidDeliveryTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Appointment {0} already has a prescription")]
    PrescriptionAlreadyIssued(Uuid),

    #[error("Appointment slot not available: {0}")]
    SlotNotAvailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_in_snake_case() {
        assert_eq!(serde_json::to_value(AppointmentStatus::Confirmed).unwrap(), "confirmed");
        assert_eq!(serde_json::to_value(DeliveryStatus::OutForDelivery).unwrap(), "out_for_delivery");
        let parsed: DeliveryStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Delivered);
    }

    #[test]
    fn delivery_steps_follow_tracker_order() {
        let mut status = DeliveryStatus::Pending;
        let mut steps = vec![status.step()];
        while let Some(next) = status.next() {
            status = next;
            steps.push(status.step());
        }
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert_eq!(status, DeliveryStatus::Delivered);
    }

    #[test]
    fn medicine_requires_every_field() {
        assert!(Medicine::new("Paracetamol 500mg", "1 tablet", "Night", "5 days").is_complete());
        assert!(!Medicine::new("Paracetamol 500mg", "", "Night", "5 days").is_complete());
    }

    #[test]
    fn patch_deserializes_partial_json() {
        let patch: AppointmentPatch = serde_json::from_str(r#"{"status":"cancelled"}"#).unwrap();
        assert_eq!(patch.status, Some(AppointmentStatus::Cancelled));
        assert!(patch.prescription.is_none());
        assert!(AppointmentPatch::default().is_empty());
    }

    #[test]
    fn transition_detects_changes() {
        let transition = Transition::new(AppointmentStatus::Pending, AppointmentStatus::Confirmed);
        assert!(transition.changed_to(|s| *s, AppointmentStatus::Confirmed));
        assert!(!transition.changed_to(|s| *s, AppointmentStatus::Cancelled));

        let unchanged = Transition::new(AppointmentStatus::Confirmed, AppointmentStatus::Confirmed);
        assert!(!unchanged.changed_to(|s| *s, AppointmentStatus::Confirmed));
    }
}
