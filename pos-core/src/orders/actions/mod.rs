//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};
use shared::models::Role;
use shared::order::{
    CustomerInfo, OrderCommand, OrderCommandPayload, OrderEvent, OrderSnapshot, OrderStatus,
};

mod add_item;
mod advance_status;
mod apply_adjustments;
mod cancel_order;
mod change_quantity;
mod checkout_cart;
mod create_order;
mod mark_delivered;
mod settle_order;
mod update_customer;

pub use add_item::AddItemAction;
pub use advance_status::AdvanceStatusAction;
pub use apply_adjustments::ApplyAdjustmentsAction;
pub use cancel_order::CancelOrderAction;
pub use change_quantity::ChangeQuantityAction;
pub use checkout_cart::CheckoutCartAction;
pub use create_order::CreateOrderAction;
pub use mark_delivered::MarkDeliveredAction;
pub use settle_order::SettleOrderAction;
pub use update_customer::UpdateCustomerAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    CreateOrder(CreateOrderAction),
    CheckoutCart(CheckoutCartAction),
    AddItem(AddItemAction),
    ChangeQuantity(ChangeQuantityAction),
    AdvanceStatus(AdvanceStatusAction),
    Settle(SettleOrderAction),
    MarkDelivered(MarkDeliveredAction),
    CancelOrder(CancelOrderAction),
    UpdateCustomer(UpdateCustomerAction),
    ApplyAdjustments(ApplyAdjustmentsAction),
}

impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::CreateOrder(action) => action.execute(ctx, metadata),
            CommandAction::CheckoutCart(action) => action.execute(ctx, metadata),
            CommandAction::AddItem(action) => action.execute(ctx, metadata),
            CommandAction::ChangeQuantity(action) => action.execute(ctx, metadata),
            CommandAction::AdvanceStatus(action) => action.execute(ctx, metadata),
            CommandAction::Settle(action) => action.execute(ctx, metadata),
            CommandAction::MarkDelivered(action) => action.execute(ctx, metadata),
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata),
            CommandAction::UpdateCustomer(action) => action.execute(ctx, metadata),
            CommandAction::ApplyAdjustments(action) => action.execute(ctx, metadata),
        }
    }
}

/// Order ids and receipt numbers generated before the transaction
#[derive(Debug, Clone)]
pub struct PreparedOrder {
    pub order_id: String,
    pub receipt_number: String,
}

impl CommandAction {
    /// Build the action for a command
    ///
    /// Creating commands need the pre-generated order id and receipt number.
    pub fn from_command(
        cmd: &OrderCommand,
        prepared: Option<PreparedOrder>,
    ) -> Result<Self, OrderError> {
        let action = match &cmd.payload {
            OrderCommandPayload::CreateOrder {
                channel,
                table_number,
                items,
                customer,
                delivery_fee,
                discount,
                settle_immediately,
            } => {
                let prepared = prepared.ok_or_else(missing_prepared)?;
                CommandAction::CreateOrder(CreateOrderAction {
                    order_id: prepared.order_id,
                    receipt_number: prepared.receipt_number,
                    channel: *channel,
                    table_number: *table_number,
                    items: items.clone(),
                    customer: stamp_customer(cmd, customer.clone()),
                    delivery_fee: *delivery_fee,
                    discount: *discount,
                    settle_immediately: settle_immediately.clone(),
                })
            }
            OrderCommandPayload::CheckoutCart {
                channel,
                customer,
                delivery_fee,
            } => {
                let prepared = prepared.ok_or_else(missing_prepared)?;
                let mut customer = customer.clone();
                if cmd.role == Role::Customer {
                    customer.customer_id = Some(cmd.operator_id.clone());
                }
                CommandAction::CheckoutCart(CheckoutCartAction {
                    order_id: prepared.order_id,
                    receipt_number: prepared.receipt_number,
                    user_id: cmd.operator_id.clone(),
                    channel: *channel,
                    customer,
                    delivery_fee: *delivery_fee,
                })
            }
            OrderCommandPayload::AddItem { order_id, item } => {
                CommandAction::AddItem(AddItemAction {
                    order_id: order_id.clone(),
                    item: item.clone(),
                })
            }
            OrderCommandPayload::ChangeQuantity {
                order_id,
                product_id,
                instance_id,
                delta,
            } => CommandAction::ChangeQuantity(ChangeQuantityAction {
                order_id: order_id.clone(),
                product_id: product_id.clone(),
                instance_id: instance_id.clone(),
                delta: *delta,
            }),
            OrderCommandPayload::AdvanceStatus { order_id } => {
                CommandAction::AdvanceStatus(AdvanceStatusAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::Settle { order_id, payment } => {
                CommandAction::Settle(SettleOrderAction {
                    order_id: order_id.clone(),
                    payment: payment.clone(),
                })
            }
            OrderCommandPayload::MarkDelivered { order_id } => {
                CommandAction::MarkDelivered(MarkDeliveredAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::CancelOrder { order_id, reason } => {
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.clone(),
                    reason: reason.clone(),
                })
            }
            OrderCommandPayload::UpdateCustomer { order_id, customer } => {
                CommandAction::UpdateCustomer(UpdateCustomerAction {
                    order_id: order_id.clone(),
                    customer: customer.clone(),
                })
            }
            OrderCommandPayload::ApplyAdjustments {
                order_id,
                delivery_fee,
                discount,
            } => CommandAction::ApplyAdjustments(ApplyAdjustmentsAction {
                order_id: order_id.clone(),
                delivery_fee: *delivery_fee,
                discount: *discount,
            }),
        };
        Ok(action)
    }
}

/// A customer always orders for itself: the order carries the caller's id
fn stamp_customer(cmd: &OrderCommand, customer: Option<CustomerInfo>) -> Option<CustomerInfo> {
    if cmd.role != Role::Customer {
        return customer;
    }
    let mut customer = customer.unwrap_or_else(|| CustomerInfo {
        name: cmd.operator_name.clone(),
        ..Default::default()
    });
    customer.customer_id = Some(cmd.operator_id.clone());
    Some(customer)
}

fn missing_prepared() -> OrderError {
    OrderError::validation("order_id", "order id must be pre-generated for creating commands")
}

/// Reject PAID / CANCELED orders with their specific error
pub(crate) fn ensure_not_terminal(snapshot: &OrderSnapshot) -> Result<(), OrderError> {
    match snapshot.status {
        OrderStatus::Paid => Err(OrderError::OrderFrozen(snapshot.order_id.clone())),
        OrderStatus::Canceled => Err(OrderError::OrderCanceled(snapshot.order_id.clone())),
        _ => Ok(()),
    }
}

pub(crate) fn validate_customer(customer: &CustomerInfo) -> Result<(), OrderError> {
    let name = customer.name.trim();
    if name.is_empty() {
        return Err(OrderError::validation("customer.name", "customer name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(OrderError::validation("customer.name", "customer name is too long"));
    }
    if customer.address.as_ref().is_some_and(|a| a.len() > MAX_ADDRESS_LEN) {
        return Err(OrderError::validation("customer.address", "address is too long"));
    }
    if customer.phone.as_ref().is_some_and(|p| p.len() > MAX_SHORT_TEXT_LEN) {
        return Err(OrderError::validation("customer.phone", "phone is too long"));
    }
    Ok(())
}
