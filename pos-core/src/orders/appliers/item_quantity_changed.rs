//! ItemQuantityChanged event applier

use super::finish;
use crate::orders::money::recalculate_totals;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct ItemQuantityChangedApplier;

impl EventApplier for ItemQuantityChangedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ItemQuantityChanged {
            instance_id,
            new_quantity,
            ..
        } = &event.payload
        {
            if *new_quantity <= 0 {
                snapshot.items.retain(|i| &i.instance_id != instance_id);
            } else if let Some(item) = snapshot
                .items
                .iter_mut()
                .find(|i| &i.instance_id == instance_id)
            {
                item.quantity = *new_quantity;
            }

            recalculate_totals(snapshot);
            finish(snapshot, event);
        }
    }
}
