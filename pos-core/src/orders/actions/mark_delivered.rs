//! MarkDelivered command handler
//!
//! Hand-over of a delivery/pickup order. Stamps the delivered time, the
//! status is unchanged (a READY order still has to be settled).

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderStatus};

#[derive(Debug, Clone)]
pub struct MarkDeliveredAction {
    pub order_id: String,
}

impl CommandHandler for MarkDeliveredAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if !snapshot.channel.is_remote() {
            return Err(OrderError::NotDeliverable(format!(
                "{:?} orders are not delivered",
                snapshot.channel
            )));
        }
        match snapshot.status {
            OrderStatus::Ready | OrderStatus::Paid => {}
            OrderStatus::Canceled => {
                return Err(OrderError::OrderCanceled(self.order_id.clone()));
            }
            status => {
                return Err(OrderError::NotDeliverable(format!(
                    "order is {status:?}, not ready"
                )));
            }
        }
        if snapshot.delivered_at.is_some() {
            return Err(OrderError::NotDeliverable("order was already delivered".to_string()));
        }

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderDelivered {},
        )])
    }
}
