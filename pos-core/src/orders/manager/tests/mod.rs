//! OrdersManager tests
//!
//! Every test runs against an in-memory redb store seeded with the default
//! menu and 12 tables.

use super::*;
use crate::catalog::CatalogService;
use rust_decimal::Decimal;
use shared::error::{ErrorCode, ErrorKind};
use shared::models::{Actor, Role};
use shared::order::{CustomerInfo, OrderItemInput, PaymentInput};
use std::str::FromStr;

mod test_rules;
mod test_tables;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn create_test_manager() -> OrdersManager {
    let store = Store::open_in_memory().unwrap();
    CatalogService::new(store.clone()).seed_products().unwrap();
    let manager = OrdersManager::with_storage(store);
    manager.tables().seed_tables(12).unwrap();
    manager
}

fn admin() -> Actor {
    Actor::new("admin-1", "Dona Maria", Role::Admin)
}

fn cashier() -> Actor {
    Actor::new("cashier-1", "Caixa Joao", Role::Cashier)
}

fn kitchen() -> Actor {
    Actor::new("kitchen-1", "Cozinha", Role::Kitchen)
}

fn customer(user_id: &str) -> Actor {
    Actor::new(user_id, "Bia", Role::Customer)
}

fn run(manager: &OrdersManager, actor: &Actor, payload: OrderCommandPayload) -> CommandResponse {
    manager.execute_command(OrderCommand::new(actor, payload))
}

fn create_payload(
    channel: OrderChannel,
    table_number: Option<u32>,
    items: Vec<OrderItemInput>,
) -> OrderCommandPayload {
    OrderCommandPayload::CreateOrder {
        channel,
        table_number,
        items,
        customer: None,
        delivery_fee: None,
        discount: None,
        settle_immediately: None,
    }
}

/// Create an order as cashier, panicking on failure
fn create_order(
    manager: &OrdersManager,
    channel: OrderChannel,
    table_number: Option<u32>,
    items: Vec<OrderItemInput>,
) -> String {
    let response = run(manager, &cashier(), create_payload(channel, table_number, items));
    assert!(response.success, "create failed: {:?}", response.error);
    response.order_id.unwrap()
}

fn counter_order(manager: &OrdersManager, items: Vec<OrderItemInput>) -> String {
    create_order(manager, OrderChannel::Counter, None, items)
}

fn advance(manager: &OrdersManager, actor: &Actor, order_id: &str) -> CommandResponse {
    run(
        manager,
        actor,
        OrderCommandPayload::AdvanceStatus {
            order_id: order_id.to_string(),
        },
    )
}

fn settle(manager: &OrdersManager, order_id: &str, payment: PaymentInput) -> CommandResponse {
    run(
        manager,
        &cashier(),
        OrderCommandPayload::Settle {
            order_id: order_id.to_string(),
            payment,
        },
    )
}

fn change_quantity(
    manager: &OrdersManager,
    order_id: &str,
    product_id: &str,
    delta: i32,
) -> CommandResponse {
    run(
        manager,
        &cashier(),
        OrderCommandPayload::ChangeQuantity {
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            instance_id: None,
            delta,
        },
    )
}

fn get(manager: &OrdersManager, order_id: &str) -> OrderSnapshot {
    manager.get_order(order_id).unwrap().unwrap()
}

/// total == max(0, Σ price × qty + fee - discount)
fn assert_balanced(order: &OrderSnapshot) {
    let subtotal: Decimal = order
        .items
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum();
    assert_eq!(order.subtotal, subtotal);
    let expected = (subtotal + order.delivery_fee - order.discount).max(Decimal::ZERO);
    assert_eq!(order.total, expected);
}
