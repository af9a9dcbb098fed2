pub mod generate_cover_letter;
pub mod notifications;
pub mod status;

pub use generate_cover_letter::generate_cover_letter;
pub use notifications::send_notification;
pub use status::{archive, check_status, update_notes};
