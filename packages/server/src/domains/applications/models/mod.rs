pub mod application;
pub mod events;

pub use application::{ApplicationInput, ApplicationPatch, ApplicationRecord, ApplicationStatus};
pub use events::{EventType, NotificationEvent};
