//! AddItem command handler

use super::ensure_not_terminal;
use crate::orders::money::validate_quantity;
use crate::orders::reducer::input_to_item;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderItemInput, OrderStatus};

/// AddItem action
///
/// Only while the order is NEW or PREPARING. An identical line (same
/// instance id) is merged by the applier.
#[derive(Debug, Clone)]
pub struct AddItemAction {
    pub order_id: String,
    pub item: OrderItemInput,
}

impl CommandHandler for AddItemAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;
        if !matches!(snapshot.status, OrderStatus::New | OrderStatus::Preparing) {
            return Err(OrderError::InvalidTransition {
                from: snapshot.status,
                action: "add items to",
            });
        }

        let product = ctx.load_product(&self.item.product_id)?;
        let item = input_to_item(&product, &self.item)?;
        if let Some(existing) = snapshot.item(&item.instance_id) {
            validate_quantity(existing.quantity + item.quantity)?;
        }

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::ItemAdded { item },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{load, run, seeded_store, try_execute};
    use crate::orders::actions::CreateOrderAction;
    use crate::orders::money::MAX_QUANTITY;
    use crate::store::Collection;
    use rust_decimal::Decimal;
    use shared::order::OrderChannel;

    fn create(store: &crate::store::Store) {
        run(
            store,
            &CreateOrderAction {
                order_id: "order-1".to_string(),
                receipt_number: "R1".to_string(),
                channel: OrderChannel::Counter,
                table_number: None,
                items: vec![OrderItemInput::new("pastel-carne", 1)],
                customer: None,
                delivery_fee: None,
                discount: None,
                settle_immediately: None,
            },
        );
    }

    fn add(product_id: &str, quantity: i32) -> AddItemAction {
        AddItemAction {
            order_id: "order-1".to_string(),
            item: OrderItemInput::new(product_id, quantity),
        }
    }

    #[test]
    fn test_add_merges_identical_line() {
        let store = seeded_store();
        create(&store);
        run(&store, &add("pastel-carne", 2));
        run(&store, &add("coca-lata", 1));

        let order = load(&store, "order-1");
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.total, Decimal::new(4400, 2));
    }

    #[test]
    fn test_notes_make_a_separate_line() {
        let store = seeded_store();
        create(&store);
        let mut action = add("pastel-carne", 1);
        action.item.notes = Some("sem cebola".to_string());
        run(&store, &action);

        assert_eq!(load(&store, "order-1").items.len(), 2);
    }

    #[test]
    fn test_add_rejected_when_ready_or_paid() {
        let store = seeded_store();
        create(&store);

        let mut order = load(&store, "order-1");
        order.status = OrderStatus::Ready;
        let txn = store.begin_write().unwrap();
        store.put_txn(&txn, Collection::Orders, "order-1", &order).unwrap();
        store.commit(txn, vec![]).unwrap();
        let err = try_execute(&store, &add("coca-lata", 1)).unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        order.status = OrderStatus::Paid;
        let txn = store.begin_write().unwrap();
        store.put_txn(&txn, Collection::Orders, "order-1", &order).unwrap();
        store.commit(txn, vec![]).unwrap();
        let err = try_execute(&store, &add("coca-lata", 1)).unwrap_err();
        assert!(matches!(err, OrderError::OrderFrozen(_)));
    }

    #[test]
    fn test_merge_cannot_exceed_max_quantity() {
        let store = seeded_store();
        create(&store);
        let err = try_execute(&store, &add("pastel-carne", MAX_QUANTITY)).unwrap_err();
        assert!(matches!(err, OrderError::Validation { field: "quantity", .. }));
    }

    #[test]
    fn test_missing_order() {
        let store = seeded_store();
        let err = try_execute(&store, &add("coca-lata", 1)).unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }
}
