//! CancelOrder command handler

use super::ensure_not_terminal;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::utils::validation::MAX_NOTE_LEN;
use shared::order::{EventPayload, OrderEvent};

/// Cancel a non-PAID order; the manager releases its table after commit
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

impl CommandHandler for CancelOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        ensure_not_terminal(&snapshot)?;

        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if reason.as_ref().is_some_and(|r| r.len() > MAX_NOTE_LEN) {
            return Err(OrderError::validation("reason", "reason is too long"));
        }

        let seq = ctx.next_sequence();
        Ok(vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderCanceled {
                reason,
                previous_status: snapshot.status,
            },
        )])
    }
}
