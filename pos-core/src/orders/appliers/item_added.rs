//! ItemAdded event applier
//!
//! A line whose instance id already exists absorbs the added quantity,
//! otherwise the line is appended.

use super::finish;
use crate::orders::money::recalculate_totals;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

pub struct ItemAddedApplier;

impl EventApplier for ItemAddedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::ItemAdded { item } = &event.payload {
            match snapshot
                .items
                .iter_mut()
                .find(|existing| existing.instance_id == item.instance_id)
            {
                Some(existing) => existing.quantity += item.quantity,
                None => snapshot.items.push(item.clone()),
            }

            recalculate_totals(snapshot);
            finish(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_events::event;
    use rust_decimal::Decimal;
    use shared::order::OrderItem;

    fn item(instance_id: &str, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: "pastel-carne".to_string(),
            instance_id: instance_id.to_string(),
            name: "Pastel de Carne".to_string(),
            description: String::new(),
            unit_price: Decimal::new(1250, 2),
            quantity,
            notes: None,
            selected_options: None,
            is_kitchen_item: true,
            line_total: Decimal::ZERO,
        }
    }

    #[test]
    fn test_merges_same_instance() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        snapshot.items.push(item("x", 1));

        let added = event(2, EventPayload::ItemAdded { item: item("x", 2) });
        ItemAddedApplier.apply(&mut snapshot, &added);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 3);
        assert_eq!(snapshot.total, Decimal::new(3750, 2));

        let added = event(3, EventPayload::ItemAdded { item: item("y", 1) });
        ItemAddedApplier.apply(&mut snapshot, &added);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.last_sequence, 3);
    }
}
