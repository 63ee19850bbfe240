//! OrderCreated event applier

use super::finish;
use crate::orders::money::recalculate_totals;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

pub struct OrderCreatedApplier;

impl EventApplier for OrderCreatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCreated {
            receipt_number,
            channel,
            table_number,
            customer,
            items,
            delivery_fee,
            discount,
        } = &event.payload
        {
            snapshot.receipt_number = receipt_number.clone();
            snapshot.channel = *channel;
            snapshot.table_number = *table_number;
            snapshot.customer = customer.clone();
            snapshot.items = items.clone();
            snapshot.delivery_fee = *delivery_fee;
            snapshot.discount = *discount;
            snapshot.status = OrderStatus::New;
            snapshot.created_by = event.operator_id.clone();
            snapshot.created_at = event.timestamp;

            recalculate_totals(snapshot);
            finish(snapshot, event);
        }
    }
}
