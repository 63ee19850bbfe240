//! UpdateCustomer command handler

use super::{ensure_not_terminal, validate_customer};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{CustomerInfo, EventPayload, OrderEvent};

#[derive(Debug, Clone)]
pub struct UpdateCustomerAction {
    pub order_id: String,
    pub customer: CustomerInfo,
}

impl CommandHandler for UpdateCustomerAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;
        validate_customer(&self.customer)?;

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::CustomerUpdated {
                customer: self.customer.clone(),
            },
        )])
    }
}
