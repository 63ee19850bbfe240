//! Role gating
//!
//! Identity is external: callers pass an [`Actor`] (id + role) and this
//! module decides whether the role may perform the operation.

pub mod permissions;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Actor, Role};
use shared::order::{OrderCommand, OrderCommandPayload};

/// Require a permission, PermissionError otherwise
pub fn require_permission(actor: &Actor, permission: &str) -> AppResult<()> {
    if permissions::has_permission(actor.role, permission) {
        return Ok(());
    }
    let code = if permission == permissions::MENU_MANAGE
        || permission == permissions::SETTINGS_MANAGE
        || permission == permissions::TABLES_MANAGE
    {
        ErrorCode::AdminRequired
    } else {
        ErrorCode::PermissionDenied
    };
    Err(AppError::with_message(
        code,
        format!("Role {} may not perform {}", actor.role, permission),
    )
    .with_detail("permission", permission)
    .with_detail("role", actor.role.as_str()))
}

/// Require that the actor owns a per-user resource (admin may act for anyone)
pub fn require_owner(actor: &Actor, owner_id: &str) -> AppResult<()> {
    if actor.role == Role::Admin || actor.user_id == owner_id {
        return Ok(());
    }
    Err(AppError::permission_denied(format!(
        "User {} may not access resources of {}",
        actor.user_id, owner_id
    )))
}

/// Permission needed for an order command
pub fn command_permission(payload: &OrderCommandPayload) -> &'static str {
    match payload {
        OrderCommandPayload::CreateOrder { .. } | OrderCommandPayload::CheckoutCart { .. } => {
            permissions::ORDERS_CREATE
        }
        OrderCommandPayload::AddItem { .. }
        | OrderCommandPayload::ChangeQuantity { .. }
        | OrderCommandPayload::UpdateCustomer { .. }
        | OrderCommandPayload::ApplyAdjustments { .. } => permissions::ORDERS_EDIT,
        OrderCommandPayload::AdvanceStatus { .. } => permissions::ORDERS_ADVANCE,
        OrderCommandPayload::Settle { .. } => permissions::ORDERS_SETTLE,
        OrderCommandPayload::CancelOrder { .. } => permissions::ORDERS_CANCEL,
        OrderCommandPayload::MarkDelivered { .. } => permissions::ORDERS_DELIVER,
    }
}

/// Role-gate an order command
///
/// Customers may only create delivery/pickup orders for themselves. They
/// may not settle them or set fees and discounts.
pub fn authorize_command(cmd: &OrderCommand) -> AppResult<()> {
    let actor = cmd.actor();
    require_permission(&actor, command_permission(&cmd.payload))?;

    if actor.role != Role::Customer {
        return Ok(());
    }

    let (channel, customer, settles, adjusts) = match &cmd.payload {
        OrderCommandPayload::CreateOrder {
            channel,
            customer,
            settle_immediately,
            delivery_fee,
            discount,
            ..
        } => (
            channel,
            customer.as_ref(),
            settle_immediately.is_some(),
            delivery_fee.is_some() || discount.is_some(),
        ),
        OrderCommandPayload::CheckoutCart {
            channel,
            customer,
            delivery_fee,
        } => (channel, Some(customer), false, delivery_fee.is_some()),
        _ => return Ok(()),
    };

    if !channel.is_remote() {
        return Err(AppError::permission_denied(
            "Customers may only place delivery or pickup orders",
        ));
    }
    if settles {
        return Err(AppError::permission_denied("Customers may not settle orders"));
    }
    // 运费走店铺默认值，折扣只能由员工给
    if adjusts {
        return Err(AppError::permission_denied(
            "Customers may not set delivery fees or discounts",
        ));
    }
    if let Some(customer_id) = customer.and_then(|c| c.customer_id.as_deref())
        && customer_id != actor.user_id
    {
        return Err(AppError::permission_denied(
            "Customers may only place orders for themselves",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::error::ErrorKind;
    use shared::order::{CustomerInfo, OrderChannel, OrderItemInput, PaymentInput};

    fn create(channel: OrderChannel, customer_id: Option<&str>) -> OrderCommandPayload {
        OrderCommandPayload::CreateOrder {
            channel,
            table_number: None,
            items: vec![OrderItemInput::new("p-1", 1)],
            customer: Some(CustomerInfo {
                customer_id: customer_id.map(str::to_string),
                name: "Bia".to_string(),
                ..Default::default()
            }),
            delivery_fee: None,
            discount: None,
            settle_immediately: None,
        }
    }

    #[test]
    fn test_customer_delivery_for_self() {
        let actor = Actor::new("c-1", "Bia", Role::Customer);
        let cmd = OrderCommand::new(&actor, create(OrderChannel::Delivery, Some("c-1")));
        assert!(authorize_command(&cmd).is_ok());
    }

    #[test]
    fn test_customer_rejected_for_counter_or_other_customer() {
        let actor = Actor::new("c-1", "Bia", Role::Customer);
        let cmd = OrderCommand::new(&actor, create(OrderChannel::Counter, Some("c-1")));
        assert_eq!(
            authorize_command(&cmd).unwrap_err().kind(),
            ErrorKind::Permission
        );

        let cmd = OrderCommand::new(&actor, create(OrderChannel::Pickup, Some("c-2")));
        assert_eq!(
            authorize_command(&cmd).unwrap_err().kind(),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_customer_cannot_settle_at_creation() {
        let actor = Actor::new("c-1", "Bia", Role::Customer);
        let mut payload = create(OrderChannel::Pickup, None);
        if let OrderCommandPayload::CreateOrder {
            settle_immediately, ..
        } = &mut payload
        {
            *settle_immediately = Some(PaymentInput::card());
        }
        let cmd = OrderCommand::new(&actor, payload);
        assert!(authorize_command(&cmd).is_err());
    }

    #[test]
    fn test_customer_cannot_set_fee_or_discount() {
        let actor = Actor::new("c-1", "Bia", Role::Customer);
        for (fee, discount) in [(Some(Decimal::ZERO), None), (None, Some(Decimal::from(5)))] {
            let mut payload = create(OrderChannel::Delivery, Some("c-1"));
            if let OrderCommandPayload::CreateOrder {
                delivery_fee: f,
                discount: d,
                ..
            } = &mut payload
            {
                *f = fee;
                *d = discount;
            }
            let err = authorize_command(&OrderCommand::new(&actor, payload)).unwrap_err();
            assert_eq!(err.code, ErrorCode::PermissionDenied);
        }

        let checkout = OrderCommandPayload::CheckoutCart {
            channel: OrderChannel::Pickup,
            customer: CustomerInfo {
                name: "Bia".to_string(),
                ..Default::default()
            },
            delivery_fee: Some(Decimal::ZERO),
        };
        let err = authorize_command(&OrderCommand::new(&actor, checkout)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);

        // 员工可以
        let cashier = Actor::new("u-1", "Ana", Role::Cashier);
        let mut payload = create(OrderChannel::Delivery, None);
        if let OrderCommandPayload::CreateOrder { discount, .. } = &mut payload {
            *discount = Some(Decimal::from(5));
        }
        assert!(authorize_command(&OrderCommand::new(&cashier, payload)).is_ok());
    }

    #[test]
    fn test_kitchen_cannot_settle() {
        let actor = Actor::new("k-1", "Chef", Role::Kitchen);
        let cmd = OrderCommand::new(
            &actor,
            OrderCommandPayload::Settle {
                order_id: "o-1".to_string(),
                payment: PaymentInput::card(),
            },
        );
        let err = authorize_command(&cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_admin_required_code_for_menu() {
        let actor = Actor::new("u-1", "Ana", Role::Cashier);
        let err = require_permission(&actor, permissions::MENU_MANAGE).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }

    #[test]
    fn test_require_owner() {
        let customer = Actor::new("c-1", "Bia", Role::Customer);
        assert!(require_owner(&customer, "c-1").is_ok());
        assert!(require_owner(&customer, "c-2").is_err());
        let admin = Actor::new("a", "Admin", Role::Admin);
        assert!(require_owner(&admin, "c-2").is_ok());
    }
}
