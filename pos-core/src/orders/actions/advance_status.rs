//! AdvanceStatus command handler (kitchen)

use super::ensure_not_terminal;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent};

/// NEW → PREPARING → READY, one step per command
#[derive(Debug, Clone)]
pub struct AdvanceStatusAction {
    pub order_id: String,
}

impl CommandHandler for AdvanceStatusAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;

        let to = snapshot
            .status
            .next_kitchen_status()
            .ok_or(OrderError::InvalidTransition {
                from: snapshot.status,
                action: "advance",
            })?;

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::StatusAdvanced {
                from: snapshot.status,
                to,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{load, run, seeded_store, try_execute};
    use crate::orders::actions::CreateOrderAction;
    use shared::order::{OrderChannel, OrderItemInput, OrderStatus};

    #[test]
    fn test_advance_to_ready_then_stop() {
        let store = seeded_store();
        run(
            &store,
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
        let advance = AdvanceStatusAction {
            order_id: "order-1".to_string(),
        };

        run(&store, &advance);
        assert_eq!(load(&store, "order-1").status, OrderStatus::Preparing);
        run(&store, &advance);
        assert_eq!(load(&store, "order-1").status, OrderStatus::Ready);

        let err = try_execute(&store, &advance).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Ready,
                ..
            }
        ));
    }
}
