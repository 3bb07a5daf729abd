// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::models::{
    Appointment, AppointmentError, AppointmentPatch, AppointmentStats, DeliveryPatch,
    NewAppointment, Prescription,
};
use crate::services::notifications::{self, Notice, NotificationHub};
use crate::services::records::{AppointmentRecords, StoreOptions};

/// Result of a mutation together with the notices it produced.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

/// Shared handle to the session's appointments. Cloning is cheap; all clones
/// see the same collection. Notices are published before the write lock is
/// released, so subscribers see them in the order the changes were applied.
#[derive(Debug, Clone)]
pub struct AppointmentStore {
    records: Arc<RwLock<AppointmentRecords>>,
    hub: NotificationHub,
}

impl AppointmentStore {
    pub fn new(options: StoreOptions, hub: NotificationHub) -> Self {
        Self {
            records: Arc::new(RwLock::new(AppointmentRecords::new(options))),
            hub,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            StoreOptions::from(config),
            NotificationHub::new(config.notification_buffer),
        )
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Loads pre-existing appointments without emitting notices.
    pub async fn seed(&self, appointments: Vec<Appointment>) -> usize {
        let mut records = self.records.write().await;
        let inserted = appointments
            .into_iter()
            .map(|appointment| records.insert(appointment))
            .filter(|inserted| *inserted)
            .count();
        info!("Seeded {} appointment(s)", inserted);
        inserted
    }

    pub async fn create(
        &self,
        request: NewAppointment,
    ) -> Result<MutationOutcome<Appointment>, AppointmentError> {
        let mut records = self.records.write().await;
        let appointment = records.create(request)?;

        let notices = vec![notifications::booked_notice(&appointment)];
        self.hub.publish_all(&notices);
        drop(records);

        Ok(MutationOutcome {
            value: appointment,
            notices,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<MutationOutcome<Appointment>, AppointmentError> {
        let mut records = self.records.write().await;
        let transition = records.update(id, patch)?;

        let notices = notifications::appointment_notices(&transition);
        debug!("Appointment {} update produced {} notice(s)", id, notices.len());
        self.hub.publish_all(&notices);
        drop(records);

        Ok(MutationOutcome {
            value: transition.current,
            notices,
        })
    }

    pub async fn update_prescription_delivery(
        &self,
        prescription_id: &str,
        patch: DeliveryPatch,
    ) -> Result<MutationOutcome<Prescription>, AppointmentError> {
        let mut records = self.records.write().await;
        let transition = records.update_prescription_delivery(prescription_id, patch)?;

        let notices: Vec<Notice> = notifications::delivery_notice(&transition).into_iter().collect();
        self.hub.publish_all(&notices);
        drop(records);

        let prescription = transition
            .current
            .prescription
            .ok_or_else(|| AppointmentError::PrescriptionNotFound(prescription_id.to_string()))?;

        Ok(MutationOutcome {
            value: prescription,
            notices,
        })
    }

    pub async fn get(&self, id: Uuid) -> Option<Appointment> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn by_patient(&self, patient_id: &str) -> Vec<Appointment> {
        self.records.read().await.by_patient(patient_id)
    }

    pub async fn by_doctor(&self, doctor_id: &str) -> Vec<Appointment> {
        self.records.read().await.by_doctor(doctor_id)
    }

    pub async fn all(&self) -> Vec<Appointment> {
        self.records.read().await.all()
    }

    pub async fn pending_prescriptions(&self) -> Vec<Prescription> {
        self.records.read().await.pending_prescriptions()
    }

    /// The appointments a user's dashboard shows.
    pub async fn for_user(&self, user: &User) -> Vec<Appointment> {
        let records = self.records.read().await;
        match user.role {
            Role::Patient => records.by_patient(&user.id),
            Role::Doctor => records.by_doctor(&user.id),
            Role::Admin => records.all(),
            Role::Delivery => records.with_prescriptions(),
        }
    }

    pub async fn stats(&self) -> AppointmentStats {
        self.records.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new(StoreOptions::default(), NotificationHub::default())
    }
}
