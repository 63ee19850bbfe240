//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions: the same event
//! stream always folds into the same snapshot.

use enum_dispatch::enum_dispatch;

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod adjustments_applied;
mod customer_updated;
mod item_added;
mod item_quantity_changed;
mod order_canceled;
mod order_created;
mod order_delivered;
mod order_settled;
mod status_advanced;

pub use adjustments_applied::AdjustmentsAppliedApplier;
pub use customer_updated::CustomerUpdatedApplier;
pub use item_added::ItemAddedApplier;
pub use item_quantity_changed::ItemQuantityChangedApplier;
pub use order_canceled::OrderCanceledApplier;
pub use order_created::OrderCreatedApplier;
pub use order_delivered::OrderDeliveredApplier;
pub use order_settled::OrderSettledApplier;
pub use status_advanced::StatusAdvancedApplier;

/// EventAction enum - dispatches to concrete applier implementations
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderCreated(OrderCreatedApplier),
    ItemAdded(ItemAddedApplier),
    ItemQuantityChanged(ItemQuantityChangedApplier),
    StatusAdvanced(StatusAdvancedApplier),
    OrderSettled(OrderSettledApplier),
    OrderDelivered(OrderDeliveredApplier),
    OrderCanceled(OrderCanceledApplier),
    CustomerUpdated(CustomerUpdatedApplier),
    AdjustmentsApplied(AdjustmentsAppliedApplier),
}

impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderCreated { .. } => EventAction::OrderCreated(OrderCreatedApplier),
            EventPayload::ItemAdded { .. } => EventAction::ItemAdded(ItemAddedApplier),
            EventPayload::ItemQuantityChanged { .. } => {
                EventAction::ItemQuantityChanged(ItemQuantityChangedApplier)
            }
            EventPayload::StatusAdvanced { .. } => {
                EventAction::StatusAdvanced(StatusAdvancedApplier)
            }
            EventPayload::OrderSettled { .. } => EventAction::OrderSettled(OrderSettledApplier),
            EventPayload::OrderDelivered {} => EventAction::OrderDelivered(OrderDeliveredApplier),
            EventPayload::OrderCanceled { .. } => EventAction::OrderCanceled(OrderCanceledApplier),
            EventPayload::CustomerUpdated { .. } => {
                EventAction::CustomerUpdated(CustomerUpdatedApplier)
            }
            EventPayload::AdjustmentsApplied { .. } => {
                EventAction::AdjustmentsApplied(AdjustmentsAppliedApplier)
            }
        }
    }
}

/// Rebuild a snapshot by folding an ordered event stream
///
/// Returns None for an empty stream.
pub fn replay(order_id: &str, events: &[OrderEvent]) -> Option<OrderSnapshot> {
    if events.is_empty() {
        return None;
    }
    let mut snapshot = OrderSnapshot::new(order_id.to_string());
    for event in events {
        let applier: EventAction = event.into();
        applier.apply(&mut snapshot, event);
    }
    Some(snapshot)
}

/// Common bookkeeping after an event was folded in
fn finish(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    snapshot.last_sequence = event.sequence;
    snapshot.updated_at = event.timestamp;
    snapshot.update_checksum();
}

#[cfg(test)]
pub(crate) mod test_events {
    use shared::order::{EventPayload, OrderEvent};

    /// Event with a fixed server timestamp so folds are deterministic
    pub fn event(sequence: u64, payload: EventPayload) -> OrderEvent {
        let mut event = OrderEvent::new(
            sequence,
            "order-1".to_string(),
            "u-1".to_string(),
            "Ana".to_string(),
            format!("cmd-{sequence}"),
            None,
            payload,
        );
        event.timestamp = 1_700_000_000_000 + sequence as i64;
        event
    }
}
