//! OrderCanceled event applier

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

pub struct OrderCanceledApplier;

impl EventApplier for OrderCanceledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCanceled { reason, .. } = &event.payload {
            snapshot.status = OrderStatus::Canceled;
            snapshot.canceled_at = Some(event.timestamp);
            snapshot.cancel_reason = reason.clone();
            finish(snapshot, event);
        }
    }
}
