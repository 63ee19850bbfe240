//! Table occupancy around table orders

use super::*;
use crate::tables::TableRegistry;
use shared::models::TableStatus;

#[test]
fn test_failed_create_drops_table_claim() {
    let manager = create_test_manager();
    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Table, Some(3), vec![OrderItemInput::new("pizza", 1)]),
    );
    assert_eq!(response.error_code(), Some(ErrorCode::ProductNotFound));

    let table = manager.tables().get_table(3).unwrap();
    assert_eq!(table.status, TableStatus::Free);
    assert!(table.current_order_id.is_none());
}

#[test]
fn test_table_channel_requires_number() {
    let manager = create_test_manager();
    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Table, None, vec![OrderItemInput::new("coca-lata", 1)]),
    );
    assert_eq!(response.error_kind(), Some(ErrorKind::Validation));

    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Table, Some(99), vec![OrderItemInput::new("coca-lata", 1)]),
    );
    assert_eq!(response.error_code(), Some(ErrorCode::TableNotFound));
}

#[test]
fn test_cancel_frees_table() {
    let manager = create_test_manager();
    let order_id = create_order(
        &manager,
        OrderChannel::Table,
        Some(4),
        vec![OrderItemInput::new("pastel-carne", 1)],
    );
    run(
        &manager,
        &cashier(),
        OrderCommandPayload::CancelOrder {
            order_id,
            reason: None,
        },
    );
    assert_eq!(manager.tables().get_table(4).unwrap().status, TableStatus::Free);

    // The table can be used again
    create_order(
        &manager,
        OrderChannel::Table,
        Some(4),
        vec![OrderItemInput::new("coca-lata", 1)],
    );
    assert_eq!(manager.tables().get_table(4).unwrap().status, TableStatus::Occupied);
}

#[test]
fn test_closed_table_rejects_orders() {
    let manager = create_test_manager();
    manager.tables().set_closed(&admin(), 2, true).unwrap();

    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Table, Some(2), vec![OrderItemInput::new("coca-lata", 1)]),
    );
    assert_eq!(response.error_code(), Some(ErrorCode::TableClosed));
    assert_eq!(manager.tables().get_table(2).unwrap().status, TableStatus::Closed);
}

#[test]
fn test_live_order_keeps_table() {
    let manager = create_test_manager();
    create_order(
        &manager,
        OrderChannel::Table,
        Some(5),
        vec![OrderItemInput::new("pastel-carne", 1)],
    );
    let err = manager.tables().release(5).unwrap_err();
    assert_eq!(err.code, ErrorCode::TableStillInUse);
    assert!(manager.tables().reconcile().unwrap().is_empty());
}

#[test]
fn test_reconcile_heals_leftover_claims() {
    let manager = create_test_manager();

    // A paid order still referenced by its table (release never happened)
    let paid = counter_order(&manager, vec![OrderItemInput::new("coca-lata", 1)]);
    settle(&manager, &paid, PaymentInput::card());
    manager.tables().occupy(6, &paid).unwrap();

    // A claim whose order was never written
    manager.tables().occupy(8, "ghost-order").unwrap();

    // Within the grace period only the paid order's claim is stale
    assert_eq!(manager.tables().reconcile().unwrap(), vec![6]);
    let response = run(
        &manager,
        &cashier(),
        create_payload(OrderChannel::Table, Some(8), vec![OrderItemInput::new("coca-lata", 1)]),
    );
    assert_eq!(response.error_kind(), Some(ErrorKind::Conflict));

    // No grace period: every orphaned claim is stale
    let impatient = TableRegistry::new(manager.store().clone(), -1);
    assert_eq!(impatient.reconcile().unwrap(), vec![8]);
    create_order(
        &manager,
        OrderChannel::Table,
        Some(8),
        vec![OrderItemInput::new("coca-lata", 1)],
    );
}

#[test]
fn test_concurrent_table_orders_single_winner() {
    let manager = create_test_manager();
    let responses: Vec<CommandResponse> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = &manager;
                scope.spawn(move || {
                    run(
                        manager,
                        &cashier(),
                        create_payload(
                            OrderChannel::Table,
                            Some(7),
                            vec![OrderItemInput::new("pastel-frango", 1)],
                        ),
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = responses.iter().filter(|r| r.success).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        responses
            .iter()
            .filter(|r| !r.success)
            .all(|r| r.error_kind() == Some(ErrorKind::Conflict))
    );

    let orders = manager.list_orders(10).unwrap();
    assert_eq!(orders.len(), 1);
    let table = manager.tables().get_table(7).unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.current_order_id, winners[0].order_id);
    assert_eq!(orders[0].table_number, Some(7));
}
