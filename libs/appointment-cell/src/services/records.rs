// libs/appointment-cell/src/services/records.rs
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, DeliveryOrdering};

use crate::models::{
    Appointment, AppointmentError, AppointmentPatch, AppointmentStats, AppointmentStatus,
    DeliveryPatch, DeliveryStatus, NewAppointment, Prescription, Transition,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::prescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub allow_double_booking: bool,
    pub delivery_ordering: DeliveryOrdering,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            allow_double_booking: false,
            delivery_ordering: DeliveryOrdering::Permissive,
        }
    }
}

impl From<&AppConfig> for StoreOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            allow_double_booking: config.allow_double_booking,
            delivery_ordering: config.delivery_ordering,
        }
    }
}

/// The appointment collection and its transition rules. Every mutation either
/// fails without touching the collection or returns the before/after pair.
#[derive(Debug, Default)]
pub struct AppointmentRecords {
    appointments: Vec<Appointment>,
    lifecycle: AppointmentLifecycleService,
    conflicts: ConflictDetectionService,
    options: StoreOptions,
}

impl AppointmentRecords {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            appointments: Vec::new(),
            lifecycle: AppointmentLifecycleService::new(),
            conflicts: ConflictDetectionService::new(),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    // ==========================================================================
    // MUTATIONS
    // ==========================================================================

    pub fn create(&mut self, request: NewAppointment) -> Result<Appointment, AppointmentError> {
        self.lifecycle.validate_new_appointment(&request)?;

        if !self.options.allow_double_booking {
            self.conflicts.check_slot(&self.appointments, &request)?;
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: self.fresh_id(),
            patient_id: request.patient_id.trim().to_string(),
            patient_name: request.patient_name.trim().to_string(),
            doctor_id: request.doctor_id.trim().to_string(),
            doctor_name: request.doctor_name.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
            date: request.date.trim().to_string(),
            time: request.time.trim().to_string(),
            status: AppointmentStatus::Pending,
            notes: request.notes,
            prescription: None,
            transcript: request.transcript,
            care_summary: request.care_summary,
            created_at: now,
            updated_at: now,
        };

        info!(
            "Created appointment {} for patient {} with doctor {} on {} at {}",
            appointment.id, appointment.patient_id, appointment.doctor_id, appointment.date, appointment.time
        );
        self.appointments.push(appointment.clone());
        Ok(appointment)
    }

    /// Adds an existing record as-is. Used for seeding; records whose
    /// appointment id or prescription id is already present are skipped.
    pub fn insert(&mut self, appointment: Appointment) -> bool {
        if self.position(appointment.id).is_some() {
            warn!("Skipping appointment {} - id already present", appointment.id);
            return false;
        }
        if let Some(rx) = &appointment.prescription {
            if self.find_prescription(&rx.id).is_some() {
                warn!(
                    "Skipping appointment {} - prescription {} already present",
                    appointment.id, rx.id
                );
                return false;
            }
        }
        self.appointments.push(appointment);
        true
    }

    pub fn update(
        &mut self,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Transition<Appointment>, AppointmentError> {
        let index = self.position(id).ok_or_else(|| {
            warn!("Update for unknown appointment {}", id);
            AppointmentError::NotFound(id)
        })?;
        let previous = self.appointments[index].clone();

        let target_status = patch.status.unwrap_or(previous.status);
        self.lifecycle
            .validate_status_transition(&previous.status, &target_status)?;

        let mut current = previous.clone();

        if let Some(draft) = patch.prescription {
            if previous.prescription.is_some() {
                warn!("Appointment {} already carries a prescription", id);
                return Err(AppointmentError::PrescriptionAlreadyIssued(id));
            }
            if target_status != AppointmentStatus::Completed {
                return Err(AppointmentError::ValidationError(
                    "a prescription can only be issued for a completed consultation".to_string(),
                ));
            }
            let draft = prescription::prepare_draft(draft)?;

            let prescription_id = match draft.id {
                Some(rx_id) => rx_id.trim().to_string(),
                None => prescription::new_prescription_id(),
            };
            if self.find_prescription(&prescription_id).is_some() {
                return Err(AppointmentError::ValidationError(format!(
                    "prescription id {} is already in use",
                    prescription_id
                )));
            }

            if patch.care_summary.is_none() {
                current.care_summary = Some(prescription::generate_care_summary(
                    &draft.medicines,
                    &draft.instructions,
                ));
            }

            current.prescription = Some(Prescription {
                id: prescription_id,
                appointment_id: id,
                medicines: draft.medicines,
                instructions: draft.instructions,
                delivery_status: DeliveryStatus::Pending,
                delivery_partner_id: None,
                delivery_partner_name: None,
            });
        }

        current.status = target_status;
        if let Some(notes) = patch.notes {
            current.notes = Some(notes);
        }
        if let Some(transcript) = patch.transcript {
            current.transcript = Some(transcript);
        }
        if let Some(care_summary) = patch.care_summary {
            current.care_summary = Some(care_summary);
        }
        current.updated_at = Utc::now();

        if previous.status != current.status {
            info!("Appointment {} moved {} -> {}", id, previous.status, current.status);
        } else {
            debug!("Appointment {} updated without status change", id);
        }

        self.appointments[index] = current.clone();
        Ok(Transition::new(previous, current))
    }

    /// Applies a delivery patch to the prescription with the given id. The
    /// returned pair holds the owning appointment before and after.
    pub fn update_prescription_delivery(
        &mut self,
        prescription_id: &str,
        patch: DeliveryPatch,
    ) -> Result<Transition<Appointment>, AppointmentError> {
        let index = self
            .appointments
            .iter()
            .position(|a| a.prescription.as_ref().map_or(false, |rx| rx.id == prescription_id))
            .ok_or_else(|| {
                warn!("Delivery update for unknown prescription {}", prescription_id);
                AppointmentError::PrescriptionNotFound(prescription_id.to_string())
            })?;

        let previous = self.appointments[index].clone();
        let mut current = previous.clone();
        let ordering = self.options.delivery_ordering;

        if let Some(rx) = current.prescription.as_mut() {
            if let Some(status) = patch.delivery_status {
                self.lifecycle
                    .validate_delivery_transition(&rx.delivery_status, &status, ordering)?;
                if rx.delivery_status != status {
                    info!("Prescription {} delivery {} -> {}", rx.id, rx.delivery_status, status);
                }
                rx.delivery_status = status;
            }
            if let Some(partner_id) = patch.delivery_partner_id {
                rx.delivery_partner_id = Some(partner_id);
            }
            if let Some(partner_name) = patch.delivery_partner_name {
                rx.delivery_partner_name = Some(partner_name);
            }
        }
        current.updated_at = Utc::now();

        self.appointments[index] = current.clone();
        Ok(Transition::new(previous, current))
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub fn get(&self, id: Uuid) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn by_patient(&self, patient_id: &str) -> Vec<Appointment> {
        self.filtered(|a| a.patient_id == patient_id)
    }

    pub fn by_doctor(&self, doctor_id: &str) -> Vec<Appointment> {
        self.filtered(|a| a.doctor_id == doctor_id)
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.appointments.clone()
    }

    pub fn with_prescriptions(&self) -> Vec<Appointment> {
        self.filtered(Appointment::has_prescription)
    }

    /// Prescriptions still waiting to reach the patient, in store order.
    pub fn pending_prescriptions(&self) -> Vec<Prescription> {
        self.appointments
            .iter()
            .filter_map(|a| a.prescription.as_ref())
            .filter(|rx| !rx.is_delivered())
            .cloned()
            .collect()
    }

    pub fn find_prescription(&self, prescription_id: &str) -> Option<&Prescription> {
        self.appointments
            .iter()
            .filter_map(|a| a.prescription.as_ref())
            .find(|rx| rx.id == prescription_id)
    }

    pub fn stats(&self) -> AppointmentStats {
        let mut stats = AppointmentStats {
            total_appointments: self.appointments.len(),
            ..AppointmentStats::default()
        };

        for appointment in &self.appointments {
            match appointment.status {
                AppointmentStatus::Pending => stats.pending_appointments += 1,
                AppointmentStatus::Confirmed => stats.confirmed_appointments += 1,
                AppointmentStatus::Completed => stats.completed_appointments += 1,
                AppointmentStatus::Cancelled => stats.cancelled_appointments += 1,
            }
            if let Some(rx) = &appointment.prescription {
                stats.prescriptions_issued += 1;
                if rx.is_delivered() {
                    stats.deliveries_completed += 1;
                } else {
                    stats.deliveries_outstanding += 1;
                }
            }
        }

        stats
    }

    fn filtered(&self, predicate: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        self.appointments.iter().filter(|a| predicate(*a)).cloned().collect()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.appointments.iter().position(|a| a.id == id)
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if self.position(id).is_none() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::models::{Medicine, PrescriptionDraft};

    fn booking(patient: &str, doctor: &str, time: &str) -> NewAppointment {
        NewAppointment {
            patient_id: patient.to_string(),
            patient_name: "Rahul Kumar".to_string(),
            doctor_id: doctor.to_string(),
            doctor_name: "Dr. Sharma".to_string(),
            specialty: "General Medicine".to_string(),
            date: "2024-01-20".to_string(),
            time: time.to_string(),
            notes: None,
            transcript: None,
            care_summary: None,
        }
    }

    fn draft(id: &str) -> PrescriptionDraft {
        PrescriptionDraft {
            id: Some(id.to_string()),
            medicines: vec![Medicine::new("Cetirizine 10mg", "1 tablet", "Night", "3 days")],
            instructions: "Take after food.".to_string(),
        }
    }

    fn completed_with(records: &mut AppointmentRecords, rx_id: &str, time: &str) -> Uuid {
        let id = records.create(booking("p1", "d1", time)).unwrap().id;
        records.update(id, AppointmentPatch::status(AppointmentStatus::Confirmed)).unwrap();
        records.update(id, AppointmentPatch::complete_with(draft(rx_id))).unwrap();
        id
    }

    #[test]
    fn failed_update_leaves_collection_untouched() {
        let mut records = AppointmentRecords::default();
        let id = records.create(booking("p1", "d1", "10:00")).unwrap().id;
        let before = records.all();

        let result = records.update(id, AppointmentPatch::complete_with(draft("rx1")));
        assert_matches!(result, Err(AppointmentError::InvalidStatusTransition { .. }));
        assert_eq!(records.all(), before);
    }

    #[test]
    fn prescription_requires_completion() {
        let mut records = AppointmentRecords::default();
        let id = records.create(booking("p1", "d1", "10:00")).unwrap().id;
        records.update(id, AppointmentPatch::status(AppointmentStatus::Confirmed)).unwrap();

        let patch = AppointmentPatch {
            prescription: Some(draft("rx1")),
            ..AppointmentPatch::default()
        };
        assert_matches!(records.update(id, patch), Err(AppointmentError::ValidationError(_)));
    }

    #[test]
    fn prescription_is_stamped_and_summarised() {
        let mut records = AppointmentRecords::default();
        let id = completed_with(&mut records, "rx1", "10:00");

        let appointment = records.get(id).unwrap();
        let rx = appointment.prescription.as_ref().unwrap();
        assert_eq!(rx.appointment_id, id);
        assert_eq!(rx.delivery_status, DeliveryStatus::Pending);
        assert!(appointment
            .care_summary
            .as_deref()
            .unwrap()
            .contains("• Cetirizine 10mg - 1 tablet, Night for 3 days"));
    }

    #[test]
    fn supplied_care_summary_wins() {
        let mut records = AppointmentRecords::default();
        let id = records.create(booking("p1", "d1", "10:00")).unwrap().id;
        records.update(id, AppointmentPatch::status(AppointmentStatus::Confirmed)).unwrap();
        records
            .update(id, AppointmentPatch::complete_with(draft("rx1")).with_care_summary("Rest for 3 days"))
            .unwrap();

        assert_eq!(records.get(id).unwrap().care_summary.as_deref(), Some("Rest for 3 days"));
    }

    #[test]
    fn second_prescription_is_rejected() {
        let mut records = AppointmentRecords::default();
        let id = completed_with(&mut records, "rx1", "10:00");

        let patch = AppointmentPatch {
            prescription: Some(draft("rx2")),
            ..AppointmentPatch::default()
        };
        assert_eq!(records.update(id, patch), Err(AppointmentError::PrescriptionAlreadyIssued(id)));
    }

    #[test]
    fn seeding_skips_duplicate_prescription_ids() {
        let mut records = AppointmentRecords::default();
        let existing = completed_with(&mut records, "rx1", "10:00");

        let mut clash = records.get(existing).unwrap().clone();
        clash.id = Uuid::new_v4();
        clash.patient_id = "p2".to_string();
        assert!(!records.insert(clash.clone()));

        clash.prescription.as_mut().unwrap().id = "rx2".to_string();
        assert!(records.insert(clash));
        assert_eq!(records.len(), 2);
        assert_eq!(records.find_prescription("rx1").unwrap().appointment_id, existing);
    }

    #[test]
    fn prescription_ids_are_unique_across_store() {
        let mut records = AppointmentRecords::default();
        completed_with(&mut records, "rx1", "10:00");

        let other = records.create(booking("p2", "d1", "11:00")).unwrap().id;
        records.update(other, AppointmentPatch::status(AppointmentStatus::Confirmed)).unwrap();
        assert_matches!(
            records.update(other, AppointmentPatch::complete_with(draft("rx1"))),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("rx1")
        );
    }

    #[test]
    fn generated_prescription_id_when_absent() {
        let mut records = AppointmentRecords::default();
        let id = records.create(booking("p1", "d1", "10:00")).unwrap().id;
        records.update(id, AppointmentPatch::status(AppointmentStatus::Confirmed)).unwrap();

        let mut rx = draft("unused");
        rx.id = None;
        let transition = records.update(id, AppointmentPatch::complete_with(rx)).unwrap();
        assert!(transition.current.prescription.unwrap().id.starts_with("rx-"));
    }

    #[test]
    fn double_booking_is_configurable() {
        let mut strict = AppointmentRecords::default();
        strict.create(booking("p1", "d1", "10:00")).unwrap();
        assert_matches!(
            strict.create(booking("p2", "d1", "10:00")),
            Err(AppointmentError::SlotNotAvailable(_))
        );

        let mut relaxed = AppointmentRecords::new(StoreOptions {
            allow_double_booking: true,
            ..StoreOptions::default()
        });
        relaxed.create(booking("p1", "d1", "10:00")).unwrap();
        assert!(relaxed.create(booking("p2", "d1", "10:00")).is_ok());
    }

    #[test]
    fn sequential_delivery_rejects_skips() {
        let mut records = AppointmentRecords::new(StoreOptions {
            delivery_ordering: DeliveryOrdering::Sequential,
            ..StoreOptions::default()
        });
        completed_with(&mut records, "rx1", "10:00");

        assert_matches!(
            records.update_prescription_delivery("rx1", DeliveryPatch::status(DeliveryStatus::Delivered)),
            Err(AppointmentError::InvalidDeliveryTransition { .. })
        );
        assert!(records
            .update_prescription_delivery("rx1", DeliveryPatch::accepted_by("4", "Delivery Partner"))
            .is_ok());
    }

    #[test]
    fn delivery_partner_fields_merge() {
        let mut records = AppointmentRecords::default();
        completed_with(&mut records, "rx1", "10:00");

        let transition = records
            .update_prescription_delivery("rx1", DeliveryPatch::accepted_by("4", "Delivery Partner"))
            .unwrap();
        let rx = transition.current.prescription.unwrap();
        assert_eq!(rx.delivery_status, DeliveryStatus::Accepted);
        assert_eq!(rx.delivery_partner_id.as_deref(), Some("4"));
        assert_eq!(rx.delivery_partner_name.as_deref(), Some("Delivery Partner"));
    }

    #[test]
    fn stats_count_statuses_and_deliveries() {
        let mut records = AppointmentRecords::default();
        completed_with(&mut records, "rx1", "09:00");
        completed_with(&mut records, "rx2", "09:30");
        records.create(booking("p1", "d1", "10:00")).unwrap();
        records
            .update_prescription_delivery("rx2", DeliveryPatch::status(DeliveryStatus::Delivered))
            .unwrap();

        let stats = records.stats();
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.pending_appointments, 1);
        assert_eq!(stats.completed_appointments, 2);
        assert_eq!(stats.prescriptions_issued, 2);
        assert_eq!(stats.deliveries_outstanding, 1);
        assert_eq!(stats.deliveries_completed, 1);
    }
}
