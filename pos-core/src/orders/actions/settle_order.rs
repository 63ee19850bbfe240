//! Settle command handler
//!
//! Records the payment and moves the order to PAID. Allowed from READY, or
//! from NEW when nothing on the order needs the kitchen; kitchen orders must
//! pass PREPARING and READY first.

use crate::orders::money::settlement_amounts;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderStatus, PaymentInput};

#[derive(Debug, Clone)]
pub struct SettleOrderAction {
    pub order_id: String,
    pub payment: PaymentInput,
}

impl CommandHandler for SettleOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Load existing snapshot
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        // 2. Validate status
        match snapshot.status {
            OrderStatus::New if snapshot.has_kitchen_items() => {
                return Err(OrderError::KitchenItemsPending);
            }
            OrderStatus::New | OrderStatus::Ready => {}
            OrderStatus::Paid => return Err(OrderError::OrderFrozen(self.order_id.clone())),
            OrderStatus::Canceled => {
                return Err(OrderError::OrderCanceled(self.order_id.clone()));
            }
            OrderStatus::Preparing => {
                return Err(OrderError::InvalidTransition {
                    from: snapshot.status,
                    action: "settle",
                });
            }
        }
        if snapshot.items.is_empty() {
            return Err(OrderError::OrderEmpty);
        }

        // 3. Amounts and owning session
        let (amount_received, change) = settlement_amounts(snapshot.total, &self.payment)?;
        let session_id = ctx.settlement_session_id()?;

        // 4. Event
        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderSettled {
                payment_type: self.payment.payment_type,
                total: snapshot.total,
                amount_received,
                change,
                session_id,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{load, run, seeded_store, try_execute};
    use crate::orders::actions::{AdvanceStatusAction, CreateOrderAction};
    use crate::sessions::SessionManager;
    use rust_decimal::Decimal;
    use shared::models::{Actor, Role};
    use shared::order::{OrderChannel, OrderItemInput, PaymentType};
    use std::str::FromStr;

    fn counter_create(items: Vec<OrderItemInput>) -> CreateOrderAction {
        CreateOrderAction {
            order_id: "order-1".to_string(),
            receipt_number: "R1".to_string(),
            channel: OrderChannel::Counter,
            table_number: None,
            items,
            customer: None,
            delivery_fee: None,
            discount: None,
            settle_immediately: None,
        }
    }

    /// Two pastéis and a caldo, still NEW
    fn setup() -> crate::store::Store {
        let store = seeded_store();
        run(
            &store,
            &counter_create(vec![
                OrderItemInput::new("pastel-carne", 2),
                OrderItemInput::new("caldo-cana", 1),
            ]),
        );
        store
    }

    /// `setup` carried through the kitchen to READY
    fn setup_ready() -> crate::store::Store {
        let store = setup();
        for _ in 0..2 {
            run(
                &store,
                &AdvanceStatusAction {
                    order_id: "order-1".to_string(),
                },
            );
        }
        store
    }

    fn settle(payment: PaymentInput) -> SettleOrderAction {
        SettleOrderAction {
            order_id: "order-1".to_string(),
            payment,
        }
    }

    #[test]
    fn test_cash_settle_with_change() {
        let store = setup_ready();
        run(&store, &settle(PaymentInput::cash(Decimal::from(50))));

        let order = load(&store, "order-1");
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total, Decimal::from_str("33.00").unwrap());
        assert_eq!(order.amount_received, Some(Decimal::from(50)));
        assert_eq!(order.change, Some(Decimal::from_str("17.00").unwrap()));
        assert!(order.paid_at.is_some());
    }

    #[test]
    fn test_insufficient_cash() {
        let store = setup_ready();
        let err = try_execute(&store, &settle(PaymentInput::cash(Decimal::from(20)))).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientPayment { .. }));
        assert_eq!(load(&store, "order-1").status, OrderStatus::Ready);
    }

    #[test]
    fn test_kitchen_order_cannot_pay_from_new() {
        let store = setup();
        let err = try_execute(&store, &settle(PaymentInput::card())).unwrap_err();
        assert!(matches!(err, OrderError::KitchenItemsPending));

        let order = load(&store, "order-1");
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.payment_type.is_none());
    }

    #[test]
    fn test_drinks_pay_from_new() {
        let store = seeded_store();
        let mut create = counter_create(vec![OrderItemInput::new("coca-lata", 2)]);
        create.order_id = "order-2".to_string();
        run(&store, &create);

        let mut action = settle(PaymentInput::cash(Decimal::from(20)));
        action.order_id = "order-2".to_string();
        run(&store, &action);
        let order = load(&store, "order-2");
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.change, Some(Decimal::from(7)));
    }

    #[test]
    fn test_settle_twice_rejected() {
        let store = setup_ready();
        run(&store, &settle(PaymentInput::card()));
        let err = try_execute(&store, &settle(PaymentInput::card())).unwrap_err();
        assert!(matches!(err, OrderError::OrderFrozen(_)));
    }

    #[test]
    fn test_settle_while_preparing_rejected() {
        let store = setup();
        run(
            &store,
            &AdvanceStatusAction {
                order_id: "order-1".to_string(),
            },
        );
        let err = try_execute(&store, &settle(PaymentInput::card())).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Preparing,
                ..
            }
        ));
    }

    #[test]
    fn test_stamps_open_session() {
        let store = setup_ready();
        let session = SessionManager::new(store.clone())
            .open(&Actor::new("c-1", "Caixa", Role::Cashier), Decimal::ZERO)
            .unwrap();

        run(&store, &settle(PaymentInput::instant_transfer()));
        let order = load(&store, "order-1");
        assert_eq!(order.session_id, Some(session.id));
        assert_eq!(order.payment_type, Some(PaymentType::InstantTransfer));
        assert_eq!(order.change, Some(Decimal::ZERO));
    }
}
