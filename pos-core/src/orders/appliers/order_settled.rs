//! OrderSettled event applier

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

pub struct OrderSettledApplier;

impl EventApplier for OrderSettledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderSettled {
            payment_type,
            amount_received,
            change,
            session_id,
            ..
        } = &event.payload
        {
            snapshot.status = OrderStatus::Paid;
            snapshot.payment_type = Some(*payment_type);
            snapshot.amount_received = Some(*amount_received);
            snapshot.change = Some(*change);
            snapshot.session_id = Some(session_id.clone());
            snapshot.paid_at = Some(event.timestamp);
            finish(snapshot, event);
        }
    }
}
