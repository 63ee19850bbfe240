//! ApplyAdjustments command handler
//!
//! Sets delivery fee and/or discount on an open order. Omitted values keep
//! their current amount; the event carries both resolved values.

use rust_decimal::Decimal;

use super::ensure_not_terminal;
use crate::orders::money::validate_amount;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent};

#[derive(Debug, Clone)]
pub struct ApplyAdjustmentsAction {
    pub order_id: String,
    pub delivery_fee: Option<Decimal>,
    pub discount: Option<Decimal>,
}

impl CommandHandler for ApplyAdjustmentsAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.delivery_fee.is_none() && self.discount.is_none() {
            return Err(OrderError::validation(
                "adjustments",
                "provide a delivery fee or a discount",
            ));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;

        let delivery_fee = self.delivery_fee.unwrap_or(snapshot.delivery_fee);
        let discount = self.discount.unwrap_or(snapshot.discount);
        validate_amount("delivery_fee", delivery_fee)?;
        validate_amount("discount", discount)?;

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::AdjustmentsApplied {
                delivery_fee,
                discount,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{load, run, seeded_store, try_execute};
    use crate::orders::actions::CreateOrderAction;
    use shared::order::{OrderChannel, OrderItemInput};
    use std::str::FromStr;

    fn setup() -> crate::store::Store {
        let store = seeded_store();
        run(
            &store,
            &CreateOrderAction {
                order_id: "order-1".to_string(),
                receipt_number: "R1".to_string(),
                channel: OrderChannel::Delivery,
                table_number: None,
                items: vec![OrderItemInput::new("pastel-bacalhau", 1)],
                customer: None,
                delivery_fee: Some(Decimal::from(5)),
                discount: None,
                settle_immediately: None,
            },
        );
        store
    }

    #[test]
    fn test_discount_keeps_fee() {
        let store = setup();
        run(
            &store,
            &ApplyAdjustmentsAction {
                order_id: "order-1".to_string(),
                delivery_fee: None,
                discount: Some(Decimal::from_str("2.50").unwrap()),
            },
        );
        let order = load(&store, "order-1");
        assert_eq!(order.delivery_fee, Decimal::from(5));
        assert_eq!(order.total, Decimal::from_str("24.50").unwrap());
    }

    #[test]
    fn test_negative_and_empty_rejected() {
        let store = setup();
        let negative = ApplyAdjustmentsAction {
            order_id: "order-1".to_string(),
            delivery_fee: Some(Decimal::from(-1)),
            discount: None,
        };
        assert!(matches!(
            try_execute(&store, &negative),
            Err(OrderError::InvalidAmount { field: "delivery_fee", .. })
        ));

        let empty = ApplyAdjustmentsAction {
            order_id: "order-1".to_string(),
            delivery_fee: None,
            discount: None,
        };
        assert!(try_execute(&store, &empty).is_err());
    }
}
