// libs/appointment-cell/src/handlers.rs
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::models::{AppointmentError, AppointmentPatch, DeliveryPatch, DeliveryStatus, NewAppointment};
use crate::services::store::AppointmentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: AppointmentStore,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: AppointmentStore) -> Self {
        Self { config, store }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let store = AppointmentStore::from_config(&config);
        Self::new(Arc::new(config), store)
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound(_) | AppointmentError::PrescriptionNotFound(_) => {
                AppError::NotFound(error.to_string())
            }
            AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::InvalidDeliveryTransition { .. }
            | AppointmentError::PrescriptionAlreadyIssued(_)
            | AppointmentError::SlotNotAvailable(_) => AppError::Conflict(error.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        }
    }
}

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    /// Only admins book on behalf of someone else.
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let (patient_id, patient_name) = match user.role {
        Role::Patient => {
            if request.patient_id.as_deref().map_or(false, |id| id != user.id) {
                return Err(AppError::Forbidden(
                    "Patients can only book appointments for themselves".to_string(),
                ));
            }
            (user.id.clone(), user.name.clone())
        }
        Role::Admin => {
            let patient_id = request.patient_id.ok_or_else(|| {
                AppError::ValidationError("patient_id is required when booking for a patient".to_string())
            })?;
            let patient_name = request.patient_name.ok_or_else(|| {
                AppError::ValidationError("patient_name is required when booking for a patient".to_string())
            })?;
            (patient_id, patient_name)
        }
        Role::Doctor | Role::Delivery => {
            return Err(AppError::Forbidden(format!("A {} cannot book appointments", user.role)));
        }
    };

    let outcome = state
        .store
        .create(NewAppointment {
            patient_id,
            patient_name,
            doctor_id: request.doctor_id,
            doctor_name: request.doctor_name,
            specialty: request.specialty,
            date: request.date,
            time: request.time,
            notes: request.notes,
            transcript: None,
            care_summary: None,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.value,
        "notices": outcome.notices,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.store.for_user(&user).await;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .get(appointment_id)
        .await
        .ok_or(AppointmentError::NotFound(appointment_id))?;

    // Verify authorization - only patient, doctor involved, or admin can view
    if !appointment.involves(&user.id) && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<Json<Value>, AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("Update contains no fields".to_string()));
    }

    let appointment = state
        .store
        .get(appointment_id)
        .await
        .ok_or(AppointmentError::NotFound(appointment_id))?;

    let is_doctor = user.role == Role::Doctor && appointment.doctor_id == user.id;
    if !is_doctor && !user.is_admin() {
        warn!("User {} attempted to update appointment {}", user.id, appointment_id);
        return Err(AppError::Forbidden(
            "Only the assigned doctor or an admin can update this appointment".to_string(),
        ));
    }

    let outcome = state.store.update(appointment_id, patch).await?;
    info!("Appointment {} updated by {}", appointment_id, user.id);

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.value,
        "notices": outcome.notices
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Only admins can view appointment statistics".to_string()));
    }

    let stats = state.store.stats().await;
    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

// ==============================================================================
// PRESCRIPTION DELIVERY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_pending_prescriptions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_delivery_access(&user)?;

    let prescriptions = state.store.pending_prescriptions().await;
    Ok(Json(json!({
        "success": true,
        "count": prescriptions.len(),
        "prescriptions": prescriptions
    })))
}

#[axum::debug_handler]
pub async fn update_prescription_delivery(
    State(state): State<AppState>,
    Path(prescription_id): Path<String>,
    Extension(user): Extension<User>,
    Json(mut patch): Json<DeliveryPatch>,
) -> Result<Json<Value>, AppError> {
    require_delivery_access(&user)?;

    // A partner accepting an order takes it on under their own identity.
    if user.role == Role::Delivery && patch.delivery_status == Some(DeliveryStatus::Accepted) {
        if patch.delivery_partner_id.is_none() {
            patch.delivery_partner_id = Some(user.id.clone());
        }
        if patch.delivery_partner_name.is_none() {
            patch.delivery_partner_name = Some(user.name.clone());
        }
    }

    let outcome = state
        .store
        .update_prescription_delivery(&prescription_id, patch)
        .await?;

    Ok(Json(json!({
        "success": true,
        "prescription": outcome.value,
        "notices": outcome.notices
    })))
}

// ==============================================================================
// NOTIFICATION STREAM
// ==============================================================================

/// Server-sent events carrying the caller's notices; admins see all of them.
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let recipient = if user.is_admin() { None } else { Some(user.id.clone()) };
    let subscription = state.store.hub().subscribe_for(recipient);
    info!(
        "User {} subscribed to notices ({} active subscriber(s))",
        user.id,
        state.store.hub().subscriber_count()
    );

    let events = stream::unfold(subscription, |mut subscription| async move {
        let notice = subscription.next().await?;
        let event = Event::default()
            .event(notice.kind.to_string())
            .json_data(&notice)
            .unwrap_or_else(|_| Event::default().comment("notice could not be encoded"));
        Some((Ok(event), subscription))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn require_delivery_access(user: &User) -> Result<(), AppError> {
    match user.role {
        Role::Delivery | Role::Admin => Ok(()),
        _ => Err(AppError::Forbidden(
            "Only delivery partners and admins can manage deliveries".to_string(),
        )),
    }
}
