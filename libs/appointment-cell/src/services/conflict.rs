// libs/appointment-cell/src/services/conflict.rs
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, NewAppointment};

#[derive(Debug, Clone, Default)]
pub struct ConflictDetectionService;

impl ConflictDetectionService {
    pub fn new() -> Self {
        Self
    }

    /// Active appointments the doctor already holds at this date and time.
    pub fn doctor_conflicts<'a>(
        &self,
        existing: &'a [Appointment],
        doctor_id: &str,
        date: &str,
        time: &str,
    ) -> Vec<&'a Appointment> {
        existing
            .iter()
            .filter(|appointment| appointment.doctor_id == doctor_id)
            .filter(|appointment| self.same_slot(appointment, date, time))
            .collect()
    }

    /// Active appointments the patient already holds at this date and time,
    /// with any doctor.
    pub fn patient_conflicts<'a>(
        &self,
        existing: &'a [Appointment],
        patient_id: &str,
        date: &str,
        time: &str,
    ) -> Vec<&'a Appointment> {
        existing
            .iter()
            .filter(|appointment| appointment.patient_id == patient_id)
            .filter(|appointment| self.same_slot(appointment, date, time))
            .collect()
    }

    /// Reject a booking whose slot is already taken by the doctor or the patient.
    pub fn check_slot(
        &self,
        existing: &[Appointment],
        request: &NewAppointment,
    ) -> Result<(), AppointmentError> {
        debug!(
            "Checking slot {} {} for doctor {} and patient {}",
            request.date, request.time, request.doctor_id, request.patient_id
        );

        let date = request.date.trim();
        let time = request.time.trim();

        if !self.doctor_conflicts(existing, &request.doctor_id, date, time).is_empty() {
            warn!("Doctor {} already booked at {} {}", request.doctor_id, date, time);
            return Err(AppointmentError::SlotNotAvailable(format!(
                "{} already has an appointment on {} at {}",
                request.doctor_name, date, time
            )));
        }

        if !self.patient_conflicts(existing, &request.patient_id, date, time).is_empty() {
            warn!("Patient {} already booked at {} {}", request.patient_id, date, time);
            return Err(AppointmentError::SlotNotAvailable(format!(
                "patient already has an appointment on {} at {}",
                date, time
            )));
        }

        Ok(())
    }

    fn same_slot(&self, appointment: &Appointment, date: &str, time: &str) -> bool {
        appointment.status.is_active() && appointment.date == date && appointment.time == time
    }
}
