//! StatusAdvanced event applier

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct StatusAdvancedApplier;

impl EventApplier for StatusAdvancedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::StatusAdvanced { to, .. } = &event.payload {
            snapshot.status = *to;
            finish(snapshot, event);
        }
    }
}
