//! Reporting - pure aggregation over order snapshots
//!
//! Nothing here touches the store. Only PAID orders count as revenue.

use crate::utils::time::local_date;
use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{CashierSession, Product, SessionSummary};
use shared::order::{OrderSnapshot, OrderStatus, PaymentType};
use std::collections::{BTreeMap, HashMap};

/// Label for lines whose product is no longer in the catalog
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub order_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub quantity: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentTotal {
    pub payment_type: PaymentType,
    pub order_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub total: Decimal,
}

fn paid(orders: &[OrderSnapshot]) -> impl Iterator<Item = &OrderSnapshot> {
    orders.iter().filter(|o| o.status == OrderStatus::Paid)
}

/// Paid orders grouped by local calendar date (ascending)
///
/// An order belongs to the day it was paid, in the business timezone.
pub fn daily_totals(orders: &[OrderSnapshot], tz: Tz) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, (usize, Decimal)> = BTreeMap::new();
    for order in paid(orders) {
        let date = local_date(order.paid_at.unwrap_or(order.created_at), tz);
        let entry = days.entry(date).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += order.total;
    }
    days.into_iter()
        .map(|(date, (order_count, total))| DailyTotal {
            date,
            order_count,
            total,
        })
        .collect()
}

/// Revenue per category, joined on product id at read time
///
/// Sorted by total descending, then category name.
pub fn category_breakdown(orders: &[OrderSnapshot], products: &[Product]) -> Vec<CategoryTotal> {
    let category_of: HashMap<&str, &str> = products
        .iter()
        .map(|p| (p.id.as_str(), p.category.as_str()))
        .collect();

    let mut totals: HashMap<&str, (i64, Decimal)> = HashMap::new();
    for order in paid(orders) {
        for item in &order.items {
            let category = category_of
                .get(item.product_id.as_str())
                .copied()
                .unwrap_or(UNCATEGORIZED);
            let entry = totals.entry(category).or_insert((0, Decimal::ZERO));
            entry.0 += i64::from(item.quantity);
            entry.1 += item.line_total;
        }
    }

    let mut result: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (quantity, total))| CategoryTotal {
            category: category.to_string(),
            quantity,
            total,
        })
        .collect();
    result.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    result
}

/// Summary of the orders settled in one cashier session
pub fn session_summary(session: &CashierSession, orders: &[OrderSnapshot]) -> SessionSummary {
    let mut order_count = 0;
    let mut cash_total = Decimal::ZERO;
    let mut card_total = Decimal::ZERO;
    let mut instant_transfer_total = Decimal::ZERO;

    for order in paid(orders).filter(|o| o.session_id.as_deref() == Some(session.id.as_str())) {
        order_count += 1;
        match order.payment_type {
            Some(PaymentType::Cash) => cash_total += order.total,
            Some(PaymentType::Card) => card_total += order.total,
            Some(PaymentType::InstantTransfer) => instant_transfer_total += order.total,
            None => {}
        }
    }

    let expected_cash = session.initial_amount + cash_total;
    SessionSummary {
        session_id: session.id.clone(),
        order_count,
        cash_total,
        card_total,
        instant_transfer_total,
        grand_total: cash_total + card_total + instant_transfer_total,
        initial_amount: session.initial_amount,
        expected_cash,
        counted_cash: session.counted_cash,
        variance: session.counted_cash.map(|counted| counted - expected_cash),
    }
}

/// Paid totals per payment type
pub fn payment_breakdown(orders: &[OrderSnapshot]) -> Vec<PaymentTotal> {
    let mut totals: BTreeMap<PaymentType, (usize, Decimal)> = BTreeMap::new();
    for order in paid(orders) {
        if let Some(payment_type) = order.payment_type {
            let entry = totals.entry(payment_type).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += order.total;
        }
    }
    totals
        .into_iter()
        .map(|(payment_type, (order_count, total))| PaymentTotal {
            payment_type,
            order_count,
            total,
        })
        .collect()
}

/// Best sellers by quantity (ties broken by revenue, then name)
pub fn top_products(orders: &[OrderSnapshot], limit: usize) -> Vec<ProductSales> {
    let mut sales: HashMap<&str, ProductSales> = HashMap::new();
    for order in paid(orders) {
        for item in &order.items {
            let entry = sales
                .entry(item.product_id.as_str())
                .or_insert_with(|| ProductSales {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    quantity: 0,
                    total: Decimal::ZERO,
                });
            entry.quantity += i64::from(item.quantity);
            entry.total += item.line_total;
        }
    }

    let mut result: Vec<ProductSales> = sales.into_values().collect();
    result.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
    });
    result.truncate(limit);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::SessionStatus;
    use shared::order::OrderItem;

    fn item(product_id: &str, price: i64, quantity: i32) -> OrderItem {
        let unit_price = Decimal::new(price, 2);
        OrderItem {
            product_id: product_id.to_string(),
            instance_id: format!("{product_id}-i"),
            name: product_id.to_uppercase(),
            description: String::new(),
            unit_price,
            quantity,
            notes: None,
            selected_options: None,
            is_kitchen_item: true,
            line_total: unit_price * Decimal::from(quantity),
        }
    }

    fn paid_order(
        id: &str,
        items: Vec<OrderItem>,
        payment: PaymentType,
        paid_at: i64,
    ) -> OrderSnapshot {
        let mut order = OrderSnapshot::new(id.to_string());
        order.total = items.iter().map(|i| i.line_total).sum();
        order.subtotal = order.total;
        order.items = items;
        order.status = OrderStatus::Paid;
        order.payment_type = Some(payment);
        order.paid_at = Some(paid_at);
        order
    }

    fn product(id: &str, category: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            category: category.to_string(),
            price: Decimal::ONE,
            image: String::new(),
            is_active: true,
            ingredients: None,
            option_groups: vec![],
            requires_preparation: true,
            sort_order: 0,
        }
    }

    #[test]
    fn test_daily_totals_use_business_timezone() {
        let tz: Tz = chrono_tz::America::Sao_Paulo;
        // 2024-03-10 23:30 local = 2024-03-11 02:30 UTC
        let late = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap().timestamp_millis();
        let next = tz.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap().timestamp_millis();

        let mut open = paid_order("o-3", vec![item("a", 100, 1)], PaymentType::Cash, next);
        open.status = OrderStatus::Ready;
        let orders = vec![
            paid_order("o-1", vec![item("a", 1250, 2)], PaymentType::Cash, late),
            paid_order("o-2", vec![item("b", 800, 1)], PaymentType::Card, next),
            open,
        ];

        let totals = daily_totals(&orders, tz);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(totals[0].total, Decimal::new(2500, 2));
        assert_eq!(totals[1].order_count, 1);
    }

    #[test]
    fn test_category_breakdown_uncategorized() {
        let orders = vec![paid_order(
            "o-1",
            vec![item("carne", 1250, 2), item("gone", 500, 1), item("coca", 650, 1)],
            PaymentType::Cash,
            0,
        )];
        let products = vec![product("carne", "Pasteis"), product("coca", "Bebidas")];

        let breakdown = category_breakdown(&orders, &products);
        assert_eq!(breakdown[0].category, "Pasteis");
        assert_eq!(breakdown[0].total, Decimal::new(2500, 2));
        let uncategorized = breakdown.iter().find(|c| c.category == UNCATEGORIZED).unwrap();
        assert_eq!(uncategorized.quantity, 1);
    }

    #[test]
    fn test_session_summary_with_variance() {
        let session = CashierSession {
            id: "s-1".to_string(),
            status: SessionStatus::Closed,
            start_time: 0,
            end_time: Some(1),
            initial_amount: Decimal::new(10000, 2),
            opened_by: "c-1".to_string(),
            closed_by: Some("c-1".to_string()),
            counted_cash: Some(Decimal::new(12000, 2)),
            note: None,
        };
        let mut cash = paid_order("o-1", vec![item("a", 2500, 1)], PaymentType::Cash, 0);
        cash.session_id = Some("s-1".to_string());
        let mut card = paid_order("o-2", vec![item("a", 1000, 1)], PaymentType::Card, 0);
        card.session_id = Some("s-1".to_string());
        let mut other = paid_order("o-3", vec![item("a", 999, 1)], PaymentType::Cash, 0);
        other.session_id = Some("manual".to_string());

        let summary = session_summary(&session, &[cash, card, other]);
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.grand_total, Decimal::new(3500, 2));
        assert_eq!(summary.expected_cash, Decimal::new(12500, 2));
        assert_eq!(summary.variance, Some(Decimal::new(-500, 2)));
    }

    #[test]
    fn test_payment_breakdown_and_top_products() {
        let orders = vec![
            paid_order("o-1", vec![item("carne", 1250, 3)], PaymentType::Cash, 0),
            paid_order(
                "o-2",
                vec![item("coca", 650, 1), item("carne", 1250, 1)],
                PaymentType::InstantTransfer,
                0,
            ),
        ];

        let payments = payment_breakdown(&orders);
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_type, PaymentType::Cash);
        assert_eq!(payments[1].total, Decimal::new(1900, 2));

        let top = top_products(&orders, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_id, "carne");
        assert_eq!(top[0].quantity, 4);
    }
}
