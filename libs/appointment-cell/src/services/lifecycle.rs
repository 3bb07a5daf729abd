// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use shared_config::DeliveryOrdering;

use crate::models::{AppointmentError, AppointmentStatus, DeliveryStatus, NewAppointment};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed. Re-applying the current
    /// status is accepted and changes nothing.
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Validate a delivery move. Permissive ordering accepts anything,
    /// sequential ordering only accepts the next step or a repeat.
    pub fn validate_delivery_transition(
        &self,
        current_status: &DeliveryStatus,
        new_status: &DeliveryStatus,
        ordering: DeliveryOrdering,
    ) -> Result<(), AppointmentError> {
        if ordering == DeliveryOrdering::Permissive || current_status == new_status {
            return Ok(());
        }

        if current_status.next() == Some(*new_status) {
            return Ok(());
        }

        warn!("Out of order delivery update rejected: {} -> {}", current_status, new_status);
        Err(AppointmentError::InvalidDeliveryTransition {
            from: *current_status,
            to: *new_status,
        })
    }

    /// Required fields and slot format for a new booking.
    pub fn validate_new_appointment(&self, request: &NewAppointment) -> Result<(), AppointmentError> {
        let required = [
            ("patient_id", &request.patient_id),
            ("patient_name", &request.patient_name),
            ("doctor_id", &request.doctor_id),
            ("doctor_name", &request.doctor_name),
            ("specialty", &request.specialty),
            ("date", &request.date),
            ("time", &request.time),
        ];

        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppointmentError::ValidationError(format!("{} is required", field)));
        }

        NaiveDate::parse_from_str(request.date.trim(), DATE_FORMAT).map_err(|_| {
            AppointmentError::ValidationError(format!(
                "date '{}' must use the YYYY-MM-DD format",
                request.date
            ))
        })?;

        NaiveTime::parse_from_str(request.time.trim(), TIME_FORMAT).map_err(|_| {
            AppointmentError::ValidationError(format!(
                "time '{}' must use the HH:MM format",
                request.time
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn booking() -> NewAppointment {
        NewAppointment {
            patient_id: "p1".to_string(),
            patient_name: "Rahul Kumar".to_string(),
            doctor_id: "d1".to_string(),
            doctor_name: "Dr. Sharma".to_string(),
            specialty: "General Medicine".to_string(),
            date: "2024-01-20".to_string(),
            time: "10:00".to_string(),
            notes: None,
            transcript: None,
            care_summary: None,
        }
    }

    #[test]
    fn pending_can_be_confirmed_or_declined() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Confirmed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Cancelled)
            .is_ok());
        assert_matches!(
            lifecycle.validate_status_transition(&AppointmentStatus::Pending, &AppointmentStatus::Completed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn terminal_states_do_not_reopen() {
        let lifecycle = AppointmentLifecycleService::new();
        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            assert!(lifecycle.get_valid_transitions(&terminal).is_empty());
            assert_eq!(
                lifecycle.validate_status_transition(&terminal, &AppointmentStatus::Pending),
                Err(AppointmentError::InvalidStatusTransition {
                    from: terminal,
                    to: AppointmentStatus::Pending,
                })
            );
        }
    }

    #[test]
    fn repeating_the_current_status_is_allowed() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&AppointmentStatus::Completed, &AppointmentStatus::Completed)
            .is_ok());
    }

    #[test]
    fn permissive_delivery_accepts_skips_and_reversals() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_delivery_transition(
                &DeliveryStatus::Pending,
                &DeliveryStatus::Delivered,
                DeliveryOrdering::Permissive
            )
            .is_ok());
        assert!(lifecycle
            .validate_delivery_transition(
                &DeliveryStatus::Delivered,
                &DeliveryStatus::Accepted,
                DeliveryOrdering::Permissive
            )
            .is_ok());
    }

    #[test]
    fn sequential_delivery_only_moves_one_step() {
        let lifecycle = AppointmentLifecycleService::new();
        let ordering = DeliveryOrdering::Sequential;
        assert!(lifecycle
            .validate_delivery_transition(&DeliveryStatus::Pending, &DeliveryStatus::Accepted, ordering)
            .is_ok());
        assert!(lifecycle
            .validate_delivery_transition(&DeliveryStatus::Accepted, &DeliveryStatus::Accepted, ordering)
            .is_ok());
        assert_matches!(
            lifecycle.validate_delivery_transition(&DeliveryStatus::Pending, &DeliveryStatus::Delivered, ordering),
            Err(AppointmentError::InvalidDeliveryTransition { .. })
        );
        assert_matches!(
            lifecycle.validate_delivery_transition(&DeliveryStatus::Delivered, &DeliveryStatus::OutForDelivery, ordering),
            Err(AppointmentError::InvalidDeliveryTransition { .. })
        );
    }

    #[test]
    fn booking_requires_fields_and_slot_format() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_new_appointment(&booking()).is_ok());

        let mut missing_doctor = booking();
        missing_doctor.doctor_name = "  ".to_string();
        assert_matches!(
            lifecycle.validate_new_appointment(&missing_doctor),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("doctor_name")
        );

        let mut bad_date = booking();
        bad_date.date = "20/01/2024".to_string();
        assert_matches!(lifecycle.validate_new_appointment(&bad_date), Err(AppointmentError::ValidationError(_)));

        let mut bad_time = booking();
        bad_time.time = "25:00".to_string();
        assert_matches!(lifecycle.validate_new_appointment(&bad_time), Err(AppointmentError::ValidationError(_)));
    }
}
