//! ChangeQuantity command handler
//!
//! Relative change of one line. The result clamps at zero and zero removes
//! the line; an order emptied this way stays open for the caller to cancel.

use super::ensure_not_terminal;
use crate::orders::money::MAX_QUANTITY;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderItem, OrderStatus};

#[derive(Debug, Clone)]
pub struct ChangeQuantityAction {
    pub order_id: String,
    pub product_id: String,
    /// Required when several lines share the product
    pub instance_id: Option<String>,
    pub delta: i32,
}

impl ChangeQuantityAction {
    fn find_line<'a>(&self, items: &'a [OrderItem]) -> Result<&'a OrderItem, OrderError> {
        if let Some(instance_id) = &self.instance_id {
            return items
                .iter()
                .find(|i| &i.instance_id == instance_id && i.product_id == self.product_id)
                .ok_or_else(|| OrderError::ItemNotFound(instance_id.clone()));
        }

        let mut lines = items.iter().filter(|i| i.product_id == self.product_id);
        match (lines.next(), lines.next()) {
            (Some(line), None) => Ok(line),
            (Some(_), Some(_)) => Err(OrderError::AmbiguousItem(self.product_id.clone())),
            (None, _) => Err(OrderError::ItemNotFound(self.product_id.clone())),
        }
    }
}

impl CommandHandler for ChangeQuantityAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.delta == 0 {
            return Err(OrderError::validation("delta", "delta must not be zero"));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;
        // 出餐后只能减少
        let allowed = match snapshot.status {
            OrderStatus::New | OrderStatus::Preparing => true,
            OrderStatus::Ready => self.delta < 0,
            OrderStatus::Paid | OrderStatus::Canceled => false,
        };
        if !allowed {
            return Err(OrderError::InvalidTransition {
                from: snapshot.status,
                action: "increase quantities of",
            });
        }

        let line = self.find_line(&snapshot.items)?;
        let new_quantity = line.quantity.saturating_add(self.delta).max(0);
        if new_quantity > MAX_QUANTITY {
            return Err(OrderError::validation(
                "quantity",
                format!("quantity exceeds maximum allowed ({MAX_QUANTITY}), got {new_quantity}"),
            ));
        }

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::ItemQuantityChanged {
                instance_id: line.instance_id.clone(),
                product_id: line.product_id.clone(),
                previous_quantity: line.quantity,
                new_quantity,
            },
        )])
    }
}
