//! Cashier sessions
//!
//! At most one session is open system-wide. Settled orders are stamped with
//! the open session's id inside the settlement transaction, the summary is
//! derived from those orders on demand.

use crate::auth::{self, permissions};
use crate::reports;
use crate::store::{Collection, Store, StoreChange, StorageResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_non_negative, validate_optional_text};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Actor, CashierSession, SessionStatus, SessionSummary};
use shared::order::OrderSnapshot;

/// Session id stamped on orders settled while no session is open
pub const MANUAL_SESSION_ID: &str = "manual";

#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Store,
}

impl SessionManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Open a session with an opening float
    pub fn open(&self, actor: &Actor, initial_amount: Decimal) -> AppResult<CashierSession> {
        auth::require_permission(actor, permissions::SESSIONS_MANAGE)?;
        validate_non_negative(initial_amount, "initial_amount")?;

        let txn = self.store.begin_write()?;
        if let Some(open) = find_open_txn(&self.store, &txn)? {
            return Err(AppError::with_message(
                ErrorCode::SessionAlreadyOpen,
                format!("Session {} is already open", open.id),
            )
            .with_detail("session_id", open.id));
        }

        let session = CashierSession {
            id: shared::util::new_id(),
            status: SessionStatus::Open,
            start_time: shared::util::now_millis(),
            end_time: None,
            initial_amount,
            opened_by: actor.user_id.clone(),
            closed_by: None,
            counted_cash: None,
            note: None,
        };
        self.store
            .put_txn(&txn, Collection::Sessions, &session.id, &session)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Sessions, &session.id)])?;

        tracing::info!(
            session_id = %session.id,
            initial_amount = %initial_amount,
            opened_by = %actor.user_id,
            "Cashier session opened"
        );
        Ok(session)
    }

    /// Close the open session
    ///
    /// `counted_cash` is the cash physically counted in the drawer; the
    /// variance against the expected amount shows up in the summary.
    pub fn close(
        &self,
        actor: &Actor,
        counted_cash: Option<Decimal>,
        note: Option<String>,
    ) -> AppResult<CashierSession> {
        auth::require_permission(actor, permissions::SESSIONS_MANAGE)?;
        if let Some(counted) = counted_cash {
            validate_non_negative(counted, "counted_cash")?;
        }
        validate_optional_text(&note, "note", MAX_NOTE_LEN)?;

        let txn = self.store.begin_write()?;
        let mut session = find_open_txn(&self.store, &txn)?.ok_or_else(|| {
            AppError::with_message(ErrorCode::NoOpenSession, "No cashier session is open")
        })?;

        session.status = SessionStatus::Closed;
        session.end_time = Some(shared::util::now_millis());
        session.closed_by = Some(actor.user_id.clone());
        session.counted_cash = counted_cash;
        session.note = note;
        self.store
            .put_txn(&txn, Collection::Sessions, &session.id, &session)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Sessions, &session.id)])?;

        tracing::info!(
            session_id = %session.id,
            closed_by = %actor.user_id,
            "Cashier session closed"
        );
        Ok(session)
    }

    /// The open session, if any
    pub fn current(&self) -> AppResult<Option<CashierSession>> {
        let sessions: Vec<CashierSession> = self.store.list(Collection::Sessions)?;
        Ok(sessions.into_iter().find(CashierSession::is_open))
    }

    pub fn get(&self, session_id: &str) -> AppResult<CashierSession> {
        self.store
            .get::<CashierSession>(Collection::Sessions, session_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::SessionNotFound,
                    format!("Session {session_id} not found"),
                )
            })
    }

    /// Session history, newest first
    pub fn list_sessions(&self, limit: usize) -> AppResult<Vec<CashierSession>> {
        let mut sessions: Vec<CashierSession> = self.store.list(Collection::Sessions)?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        Ok(sessions)
    }

    /// Per-payment-type totals of the orders settled in a session
    pub fn summarize(&self, actor: &Actor, session_id: &str) -> AppResult<SessionSummary> {
        auth::require_permission(actor, permissions::REPORTS_VIEW)?;
        let session = self.get(session_id)?;
        let orders: Vec<OrderSnapshot> = self.store.list(Collection::Orders)?;
        Ok(reports::session_summary(&session, &orders))
    }
}

fn find_open_txn(store: &Store, txn: &WriteTransaction) -> StorageResult<Option<CashierSession>> {
    let sessions: Vec<CashierSession> = store.list_txn(txn, Collection::Sessions)?;
    Ok(sessions.into_iter().find(CashierSession::is_open))
}

/// Id to stamp on an order settled inside `txn`
pub(crate) fn settlement_session_id_txn(
    store: &Store,
    txn: &WriteTransaction,
) -> StorageResult<String> {
    Ok(find_open_txn(store, txn)?
        .map(|s| s.id)
        .unwrap_or_else(|| MANUAL_SESSION_ID.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorKind;
    use shared::models::Role;
    use shared::order::{OrderStatus, PaymentType};

    fn cashier() -> Actor {
        Actor::new("c-1", "Caixa", Role::Cashier)
    }

    fn manager() -> SessionManager {
        SessionManager::new(Store::open_in_memory().unwrap())
    }

    #[test]
    fn test_single_open_session() {
        let sessions = manager();
        let opened = sessions.open(&cashier(), Decimal::new(10000, 2)).unwrap();
        assert!(opened.is_open());

        let err = sessions.open(&cashier(), Decimal::ZERO).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionAlreadyOpen);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(sessions.current().unwrap().map(|s| s.id), Some(opened.id));
    }

    #[test]
    fn test_concurrent_open_single_winner() {
        let sessions = manager();
        let results: Vec<AppResult<CashierSession>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let sessions = &sessions;
                    scope.spawn(move || {
                        let actor = Actor::new(format!("c-{i}"), "Caixa", Role::Cashier);
                        sessions.open(&actor, Decimal::ZERO)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let opened: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(opened.len(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| e.code == ErrorCode::SessionAlreadyOpen)
        );
        assert_eq!(sessions.list_sessions(10).unwrap().len(), 1);
        assert_eq!(sessions.current().unwrap().map(|s| s.id), Some(opened[0].id.clone()));
    }

    #[test]
    fn test_close_without_open_session() {
        let sessions = manager();
        let err = sessions.close(&cashier(), None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoOpenSession);
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_open_close_cycle_and_history() {
        let sessions = manager();
        let first = sessions.open(&cashier(), Decimal::ZERO).unwrap();
        let closed = sessions
            .close(&cashier(), Some(Decimal::new(5000, 2)), Some("ok".to_string()))
            .unwrap();
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.status, SessionStatus::Closed);
        assert!(sessions.current().unwrap().is_none());

        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = sessions.open(&cashier(), Decimal::ZERO).unwrap();
        let history = sessions.list_sessions(10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(sessions.list_sessions(1).unwrap().len(), 1);
    }

    #[test]
    fn test_negative_float_and_kitchen_rejected() {
        let sessions = manager();
        let err = sessions.open(&cashier(), Decimal::new(-1, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let kitchen = Actor::new("k", "Chef", Role::Kitchen);
        let err = sessions.open(&kitchen, Decimal::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
    }

    #[test]
    fn test_settlement_session_id() {
        let sessions = manager();
        let txn = sessions.store.begin_write().unwrap();
        assert_eq!(
            settlement_session_id_txn(&sessions.store, &txn).unwrap(),
            MANUAL_SESSION_ID
        );
        drop(txn);

        let opened = sessions.open(&cashier(), Decimal::ZERO).unwrap();
        let txn = sessions.store.begin_write().unwrap();
        assert_eq!(settlement_session_id_txn(&sessions.store, &txn).unwrap(), opened.id);
    }

    #[test]
    fn test_summarize_counts_session_orders() {
        let sessions = manager();
        let opened = sessions.open(&cashier(), Decimal::new(5000, 2)).unwrap();

        let mut order = OrderSnapshot::new("o-1".to_string());
        order.status = OrderStatus::Paid;
        order.total = Decimal::new(2500, 2);
        order.payment_type = Some(PaymentType::Cash);
        order.session_id = Some(opened.id.clone());
        let txn = sessions.store.begin_write().unwrap();
        sessions
            .store
            .put_txn(&txn, Collection::Orders, "o-1", &order)
            .unwrap();
        sessions.store.commit(txn, vec![]).unwrap();

        let summary = sessions.summarize(&cashier(), &opened.id).unwrap();
        assert_eq!(summary.order_count, 1);
        assert_eq!(summary.cash_total, Decimal::new(2500, 2));
        assert_eq!(summary.expected_cash, Decimal::new(7500, 2));

        let err = sessions.summarize(&cashier(), "nope").unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionNotFound);
    }
}
