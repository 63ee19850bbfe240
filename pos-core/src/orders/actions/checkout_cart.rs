//! CheckoutCart command handler
//!
//! Turns the operator's persisted cart into a delivery/pickup order. The
//! manager clears the cart in the same transaction.

use rust_decimal::Decimal;

use super::CreateOrderAction;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::store::Collection;
use shared::models::CustomerCart;
use shared::order::{CustomerInfo, OrderChannel, OrderEvent, OrderItemInput};

/// CheckoutCart action
#[derive(Debug, Clone)]
pub struct CheckoutCartAction {
    pub order_id: String,
    pub receipt_number: String,
    /// Cart owner (the operator)
    pub user_id: String,
    pub channel: OrderChannel,
    pub customer: CustomerInfo,
    pub delivery_fee: Option<Decimal>,
}

impl CommandHandler for CheckoutCartAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.channel.is_remote() {
            return Err(OrderError::validation(
                "channel",
                "cart checkout creates delivery or pickup orders only",
            ));
        }

        let cart = ctx
            .store()
            .get_txn::<CustomerCart>(ctx.txn(), Collection::Carts, &self.user_id)?
            .unwrap_or_else(|| CustomerCart::empty(self.user_id.clone()));
        if cart.is_empty() {
            return Err(OrderError::OrderEmpty);
        }

        let items = cart
            .lines
            .into_iter()
            .map(|line| OrderItemInput {
                product_id: line.product_id,
                quantity: line.quantity,
                selected_options: line.selected_options,
                notes: line.notes,
            })
            .collect();

        let mut customer = self.customer.clone();
        if customer.customer_id.is_none() {
            customer.customer_id = Some(self.user_id.clone());
        }

        CreateOrderAction {
            order_id: self.order_id.clone(),
            receipt_number: self.receipt_number.clone(),
            channel: self.channel,
            table_number: None,
            items,
            customer: Some(customer),
            delivery_fee: self.delivery_fee,
            discount: None,
            settle_immediately: None,
        }
        .execute(ctx, metadata)
    }
}
