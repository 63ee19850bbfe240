//! OrderDelivered event applier

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct OrderDeliveredApplier;

impl EventApplier for OrderDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderDelivered {} = &event.payload {
            snapshot.delivered_at = Some(event.timestamp);
            finish(snapshot, event);
        }
    }
}
