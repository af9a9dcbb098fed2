//! Send notification activity
//!
//! Fans an event out through the broadcast hub. Delivery failures are
//! isolated inside the hub per connection; nothing here raises, so a
//! bad subscriber can never disrupt workflow progress.

use tracing::debug;

use crate::domains::applications::models::NotificationEvent;
use crate::kernel::TrackerDeps;

pub async fn send_notification(deps: &TrackerDeps, event: NotificationEvent) {
    debug!(
        application_id = %event.application_id,
        event_type = %event.event_type,
        "broadcasting notification"
    );
    deps.hub.broadcast(event).await;
}
