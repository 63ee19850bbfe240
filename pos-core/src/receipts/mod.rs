//! 小票数据 (receipt / session close-out data objects)
//!
//! Rendering and transport belong to the caller; these builders only
//! assemble the data a printer or message template needs.

use crate::reports;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CashierSession, SessionSummary, StoreSettings};
use shared::order::{
    CustomerInfo, OrderChannel, OrderItem, OrderSnapshot, OrderStatus, PaymentType,
};

/// 小票明细行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// "Group: Choice" labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&OrderItem> for ReceiptLine {
    fn from(item: &OrderItem) -> Self {
        let options = item
            .selected_options
            .iter()
            .flatten()
            .map(|(group, choice)| format!("{group}: {choice}"))
            .collect();
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
            options,
            note: item.notes.clone(),
        }
    }
}

/// Order receipt (顾客小票)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub store_name: String,
    pub order_id: String,
    pub receipt_number: String,
    pub channel: OrderChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,
    pub status: OrderStatus,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
}

impl OrderReceipt {
    pub fn build(order: &OrderSnapshot, settings: &StoreSettings) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            order_id: order.order_id.clone(),
            receipt_number: order.receipt_number.clone(),
            channel: order.channel,
            table_number: order.table_number,
            customer: order.customer.clone(),
            status: order.status,
            lines: order.items.iter().map(ReceiptLine::from).collect(),
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            discount: order.discount,
            total: order.total,
            payment_type: order.payment_type,
            amount_received: order.amount_received,
            change: order.change,
            created_at: order.created_at,
            paid_at: order.paid_at,
            delivered_at: order.delivered_at,
        }
    }

    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// 交班报表 (cash close-out)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub store_name: String,
    pub opened_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub generated_at: i64,
}

impl SessionReport {
    /// `orders` may be the full order set; only this session's paid orders count
    pub fn build(
        session: &CashierSession,
        orders: &[OrderSnapshot],
        settings: &StoreSettings,
        generated_at: i64,
    ) -> Self {
        Self {
            store_name: settings.store_name.clone(),
            opened_by: session.opened_by.clone(),
            closed_by: session.closed_by.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            note: session.note.clone(),
            summary: reports::session_summary(session, orders),
            generated_at,
        }
    }
}
