//! State machine and role rules

use super::*;

#[test]
fn test_status_only_moves_forward() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);

    assert!(advance(&manager, &kitchen(), &order_id).success);
    assert!(advance(&manager, &kitchen(), &order_id).success);
    let response = advance(&manager, &kitchen(), &order_id);
    assert_eq!(response.error_code(), Some(ErrorCode::InvalidStatusTransition));
    assert_eq!(get(&manager, &order_id).status, OrderStatus::Ready);

    assert!(settle(&manager, &order_id, PaymentInput::card()).success);
    let response = advance(&manager, &kitchen(), &order_id);
    assert_eq!(response.error_code(), Some(ErrorCode::OrderFrozen));
}

#[test]
fn test_settle_twice_fails_cleanly() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("coca-lata", 1)]);
    assert!(settle(&manager, &order_id, PaymentInput::cash(dec("10.00"))).success);
    let paid = get(&manager, &order_id);

    let response = settle(&manager, &order_id, PaymentInput::cash(dec("10.00")));
    assert!(!response.success);
    assert_eq!(response.error_kind(), Some(ErrorKind::InvalidState));
    assert_eq!(get(&manager, &order_id), paid);
    assert_eq!(manager.order_events(&order_id).unwrap().len(), 2);
}

#[test]
fn test_settle_while_preparing_rejected() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);
    advance(&manager, &kitchen(), &order_id);

    let response = settle(&manager, &order_id, PaymentInput::card());
    assert_eq!(response.error_code(), Some(ErrorCode::InvalidStatusTransition));
}

#[test]
fn test_kitchen_order_settles_only_when_ready() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);

    let response = settle(&manager, &order_id, PaymentInput::card());
    assert_eq!(response.error_code(), Some(ErrorCode::KitchenItemsPending));
    assert_eq!(get(&manager, &order_id).status, OrderStatus::New);
    let queue = manager.kitchen_queue().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].order_id, order_id);

    advance(&manager, &kitchen(), &order_id);
    advance(&manager, &kitchen(), &order_id);
    assert!(settle(&manager, &order_id, PaymentInput::card()).success);
    assert_eq!(manager.kitchen_history(10).unwrap()[0].order_id, order_id);
}

#[test]
fn test_paid_order_is_frozen() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("coca-lata", 1)]);
    settle(&manager, &order_id, PaymentInput::card());

    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::AddItem {
            order_id: order_id.clone(),
            item: OrderItemInput::new("coca-lata", 1),
        },
    );
    assert_eq!(response.error_code(), Some(ErrorCode::OrderFrozen));

    let response = change_quantity(&manager, &order_id, "coca-lata", -1);
    assert_eq!(response.error_code(), Some(ErrorCode::OrderFrozen));

    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::CancelOrder {
            order_id: order_id.clone(),
            reason: None,
        },
    );
    assert_eq!(response.error_code(), Some(ErrorCode::OrderFrozen));
    assert_eq!(get(&manager, &order_id).total, dec("6.50"));
}

#[test]
fn test_add_item_only_before_ready() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);
    let add = |manager: &OrdersManager| {
        run(
            manager,
            &cashier(),
            OrderCommandPayload::AddItem {
                order_id: order_id.clone(),
                item: OrderItemInput::new("pastel-carne", 1),
            },
        )
    };

    assert!(add(&manager).success);
    advance(&manager, &kitchen(), &order_id);
    assert!(add(&manager).success);
    assert_eq!(get(&manager, &order_id).items[0].quantity, 3);

    advance(&manager, &kitchen(), &order_id);
    let response = add(&manager);
    assert_eq!(response.error_code(), Some(ErrorCode::InvalidStatusTransition));
}

#[test]
fn test_cancel_is_terminal() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);
    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::CancelOrder {
            order_id: order_id.clone(),
            reason: Some("cliente desistiu".to_string()),
        },
    );
    assert!(response.success);

    let order = get(&manager, &order_id);
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(order.cancel_reason.as_deref(), Some("cliente desistiu"));
    assert!(order.payment_type.is_none());

    let response = settle(&manager, &order_id, PaymentInput::card());
    assert_eq!(response.error_code(), Some(ErrorCode::OrderCanceled));
    let response = advance(&manager, &kitchen(), &order_id);
    assert_eq!(response.error_code(), Some(ErrorCode::OrderCanceled));
}

#[test]
fn test_catalog_rejections() {
    let manager = create_test_manager();
    let catalog = CatalogService::new(manager.store().clone());
    catalog.deactivate_product(&admin(), "pastel-bacalhau").unwrap();

    let response = run(
        &manager,
        &cashier(),
        create_payload(
            OrderChannel::Counter,
            None,
            vec![OrderItemInput::new("pastel-bacalhau", 1)],
        ),
    );
    assert_eq!(response.error_code(), Some(ErrorCode::ProductInactive));

    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Counter, None, vec![OrderItemInput::new("pizza", 1)]),
    );
    assert_eq!(response.error_code(), Some(ErrorCode::ProductNotFound));

    let response = run(&manager, &cashier(), create_payload(OrderChannel::Counter, None, vec![]));
    assert_eq!(response.error_code(), Some(ErrorCode::OrderEmpty));
    assert!(manager.list_orders(10).unwrap().is_empty());
}

#[test]
fn test_price_captured_at_add_time() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("coca-lata", 1)]);

    let catalog = CatalogService::new(manager.store().clone());
    let mut product = catalog.get_product("coca-lata").unwrap();
    product.price = dec("7.00");
    catalog
        .upsert_product(&admin(), product_upsert(product))
        .unwrap();

    assert_eq!(get(&manager, &order_id).total, dec("6.50"));
    let later = counter_order(&manager, vec![OrderItemInput::new("coca-lata", 1)]);
    assert_eq!(get(&manager, &later).total, dec("7.00"));
}

fn product_upsert(product: shared::models::Product) -> shared::models::ProductUpsert {
    shared::models::ProductUpsert {
        id: Some(product.id),
        name: product.name,
        description: product.description,
        category: product.category,
        price: product.price,
        image: product.image,
        is_active: product.is_active,
        ingredients: product.ingredients,
        option_groups: product.option_groups,
        requires_preparation: product.requires_preparation,
        sort_order: product.sort_order,
    }
}

#[test]
fn test_customer_restrictions() {
    let manager = create_test_manager();
    let bia = customer("cust-1");

    let response = run(
        &manager,
        &bia,
        create_payload(
            OrderChannel::Counter,
            None,
            vec![OrderItemInput::new("coca-lata", 1)],
        ),
    );
    assert_eq!(response.error_kind(), Some(ErrorKind::Permission));

    let response = run(
        &manager,
        &bia,
        create_payload(
            OrderChannel::Delivery,
            None,
            vec![OrderItemInput::new("coca-lata", 1)],
        ),
    );
    assert!(response.success);
    let order_id = response.order_id.unwrap();

    // The order belongs to the caller even without customer details
    let customer_info = get(&manager, &order_id).customer.unwrap();
    assert_eq!(customer_info.customer_id.as_deref(), Some("cust-1"));
    assert_eq!(customer_info.name, "Bia");

    // A customer cannot zero out its own total
    let response = run(
        &manager,
        &bia,
        OrderCommandPayload::CreateOrder {
            channel: OrderChannel::Delivery,
            table_number: None,
            items: vec![OrderItemInput::new("pastel-carne", 2)],
            customer: None,
            delivery_fee: Some(Decimal::ZERO),
            discount: Some(dec("1000")),
            settle_immediately: None,
        },
    );
    assert_eq!(response.error_code(), Some(ErrorCode::PermissionDenied));
    assert_eq!(manager.list_orders(10).unwrap().len(), 1);

    let response = run(
        &manager,
        &bia,
        OrderCommandPayload::CancelOrder {
            order_id,
            reason: None,
        },
    );
    assert_eq!(response.error_kind(), Some(ErrorKind::Permission));
}

#[test]
fn test_update_customer_and_adjustments() {
    let manager = create_test_manager();
    let order_id = counter_order(&manager, vec![OrderItemInput::new("pastel-carne", 1)]);

    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::UpdateCustomer {
            order_id: order_id.clone(),
            customer: CustomerInfo {
                name: "  ".to_string(),
                ..Default::default()
            },
        },
    );
    assert_eq!(response.error_kind(), Some(ErrorKind::Validation));

    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::UpdateCustomer {
            order_id: order_id.clone(),
            customer: CustomerInfo {
                name: "Mesa da janela".to_string(),
                ..Default::default()
            },
        },
    );
    assert!(response.success);

    let response = run(
        &manager,
        &cashier(),
        OrderCommandPayload::ApplyAdjustments {
            order_id: order_id.clone(),
            delivery_fee: None,
            discount: Some(dec("-1.00")),
        },
    );
    assert_eq!(response.error_code(), Some(ErrorCode::InvalidAmount));

    let order = get(&manager, &order_id);
    assert_eq!(order.customer.unwrap().name, "Mesa da janela");
    assert_eq!(order.total, dec("12.50"));
}

#[test]
fn test_unknown_order() {
    let manager = create_test_manager();
    let response = advance(&manager, &kitchen(), "missing");
    assert_eq!(response.error_code(), Some(ErrorCode::OrderNotFound));
    assert!(manager.get_order("missing").unwrap().is_none());
}
