pub mod conflict;
pub mod lifecycle;
pub mod notifications;
pub mod prescription;
pub mod records;
pub mod store;

pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use notifications::{Notice, NoticeKind, NoticeSubscription, NoticeTone, NotificationHub};
pub use records::{AppointmentRecords, StoreOptions};
pub use store::{AppointmentStore, MutationOutcome};
