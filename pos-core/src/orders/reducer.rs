//! Order line construction
//!
//! - `generate_instance_id`: content-addressed line identity
//! - `input_to_item`: build a line from client input and the catalog entry
//!
//! Event application lives in the appliers module.

use crate::orders::money::{line_total, validate_quantity};
use crate::orders::traits::OrderError;
use crate::utils::validation::MAX_NOTE_LEN;
use rust_decimal::Decimal;
use shared::models::Product;
use shared::order::{OrderItem, OrderItemInput};
use std::collections::BTreeMap;

/// Generate a content-addressed instance_id
///
/// Hash of product id, unit price, selected options and notes. Lines with
/// the same instance_id are merged (quantities added together).
pub fn generate_instance_id(
    product_id: &str,
    unit_price: Decimal,
    options: &Option<BTreeMap<String, String>>,
    notes: &Option<String>,
) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(product_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(unit_price.normalize().to_string().as_bytes());

    // BTreeMap iterates in key order, so the hash is stable
    if let Some(opts) = options {
        for (group, choice) in opts {
            hasher.update([0u8]);
            hasher.update(group.as_bytes());
            hasher.update([1u8]);
            hasher.update(choice.as_bytes());
        }
    }

    if let Some(notes) = notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        hasher.update([2u8]);
        hasher.update(notes.as_bytes());
    }

    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Check option selections against the product's option groups
pub fn validate_options(
    product: &Product,
    selected: &Option<BTreeMap<String, String>>,
) -> Result<(), OrderError> {
    let empty = BTreeMap::new();
    let selected = selected.as_ref().unwrap_or(&empty);

    for (group_name, choice) in selected {
        let group = product.option_group(group_name).ok_or_else(|| {
            OrderError::InvalidOptionSelection(format!(
                "{} has no option group {}",
                product.name, group_name
            ))
        })?;
        if !group.has_choice(choice) {
            return Err(OrderError::InvalidOptionSelection(format!(
                "{choice} is not a valid choice for {group_name}"
            )));
        }
    }

    if let Some(missing) = product
        .option_groups
        .iter()
        .find(|g| g.required && !selected.contains_key(&g.name))
    {
        return Err(OrderError::InvalidOptionSelection(format!(
            "{} requires a choice for {}",
            product.name, missing.name
        )));
    }
    Ok(())
}

/// Build an order line, capturing name, description and price from the catalog
pub fn input_to_item(product: &Product, input: &OrderItemInput) -> Result<OrderItem, OrderError> {
    if !product.is_active {
        return Err(OrderError::ProductInactive(product.id.clone()));
    }
    validate_quantity(input.quantity)?;
    validate_options(product, &input.selected_options)?;

    let notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if notes.as_ref().is_some_and(|n| n.len() > MAX_NOTE_LEN) {
        return Err(OrderError::validation("notes", "notes are too long"));
    }
    // 空 map 与 None 等价
    let selected_options = input
        .selected_options
        .clone()
        .filter(|opts| !opts.is_empty());

    Ok(OrderItem {
        product_id: product.id.clone(),
        instance_id: generate_instance_id(&product.id, product.price, &selected_options, &notes),
        name: product.name.clone(),
        description: product.description.clone(),
        unit_price: product.price,
        quantity: input.quantity,
        notes,
        selected_options,
        is_kitchen_item: product.requires_preparation,
        line_total: line_total(product.price, input.quantity),
    })
}
