//! CreateOrder command handler
//!
//! Creates an order with catalog-priced lines. A non-kitchen order may be
//! settled in the same command (counter sale of drinks).

use rust_decimal::Decimal;

use super::validate_customer;
use crate::orders::money::{
    line_total, recalculate_totals, settlement_amounts, validate_amount, validate_quantity,
};
use crate::orders::reducer::input_to_item;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{
    CustomerInfo, EventPayload, OrderChannel, OrderEvent, OrderItem, OrderItemInput,
    OrderSnapshot, PaymentInput,
};

/// CreateOrder action
#[derive(Debug, Clone)]
pub struct CreateOrderAction {
    /// Pre-generated by the manager (the table is claimed with it)
    pub order_id: String,
    pub receipt_number: String,
    pub channel: OrderChannel,
    pub table_number: Option<u32>,
    pub items: Vec<OrderItemInput>,
    pub customer: Option<CustomerInfo>,
    pub delivery_fee: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub settle_immediately: Option<PaymentInput>,
}

impl CommandHandler for CreateOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Validate shape
        if self.items.is_empty() {
            return Err(OrderError::OrderEmpty);
        }
        match (self.channel, self.table_number) {
            (OrderChannel::Table, None) => {
                return Err(OrderError::validation(
                    "table_number",
                    "table orders need a table number",
                ));
            }
            (OrderChannel::Table, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(OrderError::validation(
                    "table_number",
                    "only table orders carry a table number",
                ));
            }
        }
        if let Some(customer) = &self.customer {
            validate_customer(customer)?;
        }

        let delivery_fee = match (self.delivery_fee, self.channel) {
            (Some(fee), _) => fee,
            (None, OrderChannel::Delivery) => ctx.store_settings()?.default_delivery_fee,
            (None, _) => Decimal::ZERO,
        };
        validate_amount("delivery_fee", delivery_fee)?;
        let discount = self.discount.unwrap_or(Decimal::ZERO);
        validate_amount("discount", discount)?;

        // 2. Price lines from the catalog, merge identical ones
        let mut items: Vec<OrderItem> = Vec::with_capacity(self.items.len());
        for input in &self.items {
            let product = ctx.load_product(&input.product_id)?;
            let item = input_to_item(&product, input)?;
            match items.iter_mut().find(|i| i.instance_id == item.instance_id) {
                Some(existing) => {
                    let merged = existing.quantity + item.quantity;
                    validate_quantity(merged)?;
                    existing.quantity = merged;
                    existing.line_total = line_total(existing.unit_price, merged);
                }
                None => items.push(item),
            }
        }

        // 3. Immediate settlement only without kitchen work
        let settlement = match &self.settle_immediately {
            Some(payment) => {
                if items.iter().any(|i| i.is_kitchen_item) {
                    return Err(OrderError::KitchenItemsPending);
                }
                let mut draft = OrderSnapshot::new(self.order_id.clone());
                draft.items = items.clone();
                draft.delivery_fee = delivery_fee;
                draft.discount = discount;
                recalculate_totals(&mut draft);
                let (amount_received, change) = settlement_amounts(draft.total, payment)?;
                Some(EventPayload::OrderSettled {
                    payment_type: payment.payment_type,
                    total: draft.total,
                    amount_received,
                    change,
                    session_id: ctx.settlement_session_id()?,
                })
            }
            None => None,
        };

        // 4. Events
        let seq = ctx.next_sequence();
        let mut events = vec![OrderEvent::new(
            seq,
            self.order_id.clone(),
            metadata.operator_id.clone(),
            metadata.operator_name.clone(),
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            EventPayload::OrderCreated {
                receipt_number: self.receipt_number.clone(),
                channel: self.channel,
                table_number: self.table_number,
                customer: self.customer.clone(),
                items,
                delivery_fee,
                discount,
            },
        )];

        if let Some(payload) = settlement {
            let seq = ctx.next_sequence();
            events.push(OrderEvent::new(
                seq,
                self.order_id.clone(),
                metadata.operator_id.clone(),
                metadata.operator_name.clone(),
                metadata.command_id.clone(),
                Some(metadata.timestamp),
                payload,
            ));
        }

        Ok(events)
    }
}
