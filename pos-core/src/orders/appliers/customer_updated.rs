//! CustomerUpdated event applier

use super::finish;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct CustomerUpdatedApplier;

impl EventApplier for CustomerUpdatedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::CustomerUpdated { customer } = &event.payload {
            snapshot.customer = Some(customer.clone());
            finish(snapshot, event);
        }
    }
}
