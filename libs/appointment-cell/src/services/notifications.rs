// libs/appointment-cell/src/services/notifications.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, DeliveryStatus, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Booked,
    Confirmed,
    Cancelled,
    Completed,
    Prescribed,
    DeliveryAccepted,
    OutForDelivery,
    Delivered,
}

impl NoticeKind {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeKind::Booked => "Appointment Booked!",
            NoticeKind::Confirmed => "Appointment Confirmed!",
            NoticeKind::Cancelled => "Appointment Declined",
            NoticeKind::Completed => "Consultation Completed!",
            NoticeKind::Prescribed => "Prescription Created!",
            NoticeKind::DeliveryAccepted => "Delivery Accepted",
            NoticeKind::OutForDelivery => "Out for Delivery",
            NoticeKind::Delivered => "Delivered!",
        }
    }

    pub fn tone(&self) -> NoticeTone {
        match self {
            NoticeKind::Cancelled => NoticeTone::Error,
            NoticeKind::DeliveryAccepted | NoticeKind::OutForDelivery => NoticeTone::Info,
            _ => NoticeTone::Success,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoticeKind::Booked => "booked",
            NoticeKind::Confirmed => "confirmed",
            NoticeKind::Cancelled => "cancelled",
            NoticeKind::Completed => "completed",
            NoticeKind::Prescribed => "prescribed",
            NoticeKind::DeliveryAccepted => "delivery_accepted",
            NoticeKind::OutForDelivery => "out_for_delivery",
            NoticeKind::Delivered => "delivered",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeTone {
    Success,
    Error,
    Info,
}

/// Fire-and-forget message describing a state change, addressed to a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub tone: NoticeTone,
    pub title: String,
    pub description: String,
    pub recipient_id: String,
    pub appointment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, appointment: &Appointment, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            tone: kind.tone(),
            title: kind.title().to_string(),
            description,
            recipient_id: appointment.patient_id.clone(),
            appointment_id: appointment.id,
            created_at: Utc::now(),
        }
    }
}

// ==============================================================================
// NOTICE DERIVATION
// ==============================================================================

pub fn booked_notice(appointment: &Appointment) -> Notice {
    Notice::new(
        NoticeKind::Booked,
        appointment,
        format!(
            "Your appointment with {} on {} at {} is pending confirmation.",
            appointment.doctor_name, appointment.date, appointment.time
        ),
    )
}

/// Notices implied by an appointment update. The checks are independent, so a
/// single update that completes and prescribes yields two notices.
pub fn appointment_notices(transition: &Transition<Appointment>) -> Vec<Notice> {
    let appointment = &transition.current;
    let mut notices = Vec::new();

    if transition.changed_to(|a| a.status, AppointmentStatus::Confirmed) {
        notices.push(Notice::new(
            NoticeKind::Confirmed,
            appointment,
            format!(
                "Your appointment with {} on {} has been confirmed.",
                appointment.doctor_name, appointment.date
            ),
        ));
    }

    if transition.changed_to(|a| a.status, AppointmentStatus::Cancelled) {
        notices.push(Notice::new(
            NoticeKind::Cancelled,
            appointment,
            format!("The appointment on {} was not accepted.", appointment.date),
        ));
    }

    if transition.changed_to(|a| a.status, AppointmentStatus::Completed) {
        notices.push(Notice::new(
            NoticeKind::Completed,
            appointment,
            format!("Your consultation with {} is complete.", appointment.doctor_name),
        ));
    }

    if transition.previous.prescription.is_none() {
        if let Some(prescription) = &appointment.prescription {
            notices.push(Notice::new(
                NoticeKind::Prescribed,
                appointment,
                format!(
                    "{} medicine(s) prescribed. Delivery team notified.",
                    prescription.medicines.len()
                ),
            ));
        }
    }

    notices
}

/// At most one notice for a delivery update: the state it moved into.
pub fn delivery_notice(transition: &Transition<Appointment>) -> Option<Notice> {
    let previous = transition.previous.delivery_status()?;
    let current = transition.current.delivery_status()?;

    if previous == current {
        return None;
    }

    let (kind, description) = match current {
        DeliveryStatus::Accepted => (
            NoticeKind::DeliveryAccepted,
            "A delivery partner has accepted your medicine order.",
        ),
        DeliveryStatus::OutForDelivery => (NoticeKind::OutForDelivery, "Your medicines are on the way!"),
        DeliveryStatus::Delivered => (
            NoticeKind::Delivered,
            "Your medicines have been delivered successfully.",
        ),
        DeliveryStatus::Pending => return None,
    };

    Some(Notice::new(kind, &transition.current, description.to_string()))
}

// ==============================================================================
// NOTIFICATION HUB
// ==============================================================================

pub type NoticeSender = broadcast::Sender<Notice>;
pub type NoticeReceiver = broadcast::Receiver<Notice>;

/// Fans notices out to every subscriber. Publishing without subscribers is
/// fine; notices are transient.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: NoticeSender,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, notice: &Notice) -> usize {
        match self.sender.send(notice.clone()) {
            Ok(receivers) => {
                debug!("Published {} notice to {} subscriber(s)", notice.kind, receivers);
                receivers
            }
            Err(_) => {
                debug!("No subscribers for {} notice {}", notice.kind, notice.id);
                0
            }
        }
    }

    pub fn publish_all(&self, notices: &[Notice]) {
        for notice in notices {
            self.publish(notice);
        }
    }

    pub fn subscribe(&self) -> NoticeReceiver {
        self.sender.subscribe()
    }

    /// Subscription limited to one recipient, or every notice for `None`.
    pub fn subscribe_for(&self, recipient_id: Option<String>) -> NoticeSubscription {
        NoticeSubscription {
            receiver: self.sender.subscribe(),
            recipient_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct NoticeSubscription {
    receiver: NoticeReceiver,
    recipient_id: Option<String>,
}

impl NoticeSubscription {
    /// Next notice for this subscriber, or `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Notice> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) => {
                    let wanted = self
                        .recipient_id
                        .as_deref()
                        .map_or(true, |recipient| recipient == notice.recipient_id);
                    if wanted {
                        return Some(notice);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Notice subscriber lagged, skipped {} notice(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
