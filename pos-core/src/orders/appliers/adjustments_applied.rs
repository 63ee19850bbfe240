//! AdjustmentsApplied event applier

use super::finish;
use crate::orders::money::recalculate_totals;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct AdjustmentsAppliedApplier;

impl EventApplier for AdjustmentsAppliedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::AdjustmentsApplied {
            delivery_fee,
            discount,
        } = &event.payload
        {
            snapshot.delivery_fee = *delivery_fee;
            snapshot.discount = *discount;
            recalculate_totals(snapshot);
            finish(snapshot, event);
        }
    }
}
