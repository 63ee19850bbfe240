//! Customer carts (数字菜单购物车)
//!
//! One cart per user, keyed by user id. Lines are validated against the
//! catalog when added; prices are not stored, the order captures them at
//! checkout (`CHECKOUT_CART` command).

use crate::auth;
use crate::orders::money::{MAX_QUANTITY, validate_quantity};
use crate::orders::reducer::validate_options;
use crate::store::{Collection, Store, StoreChange};
use crate::utils::validation::MAX_NOTE_LEN;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Actor, CartLine, CustomerCart, Product};

#[derive(Debug, Clone)]
pub struct CartService {
    store: Store,
}

impl CartService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The user's cart (empty if never written)
    pub fn get_cart(&self, actor: &Actor, user_id: &str) -> AppResult<CustomerCart> {
        auth::require_owner(actor, user_id)?;
        Ok(self
            .store
            .get::<CustomerCart>(Collection::Carts, user_id)?
            .unwrap_or_else(|| CustomerCart::empty(user_id)))
    }

    /// Add a line; identical lines (product, options, notes) merge
    pub fn add_line(
        &self,
        actor: &Actor,
        user_id: &str,
        line: CartLine,
    ) -> AppResult<CustomerCart> {
        auth::require_owner(actor, user_id)?;
        let line = normalize_line(line);

        let txn = self.store.begin_write()?;
        let product = self
            .store
            .get_txn::<Product>(&txn, Collection::Products, &line.product_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product not found: {}", line.product_id),
                )
                .with_detail("product_id", line.product_id.clone())
            })?;
        validate_line(&product, &line)?;

        let mut cart = self
            .store
            .get_txn::<CustomerCart>(&txn, Collection::Carts, user_id)?
            .unwrap_or_else(|| CustomerCart::empty(user_id));

        match cart.lines.iter_mut().find(|l| same_line(l, &line)) {
            Some(existing) => {
                let merged = existing.quantity + line.quantity;
                if merged > MAX_QUANTITY {
                    return Err(AppError::with_message(
                        ErrorCode::ValueOutOfRange,
                        format!("quantity must not exceed {MAX_QUANTITY}"),
                    )
                    .with_detail("field", "quantity"));
                }
                existing.quantity = merged;
            }
            None => cart.lines.push(line),
        }

        self.save(txn, cart)
    }

    /// Set the quantity of the line at `index`; 0 removes it
    pub fn set_quantity(
        &self,
        actor: &Actor,
        user_id: &str,
        index: usize,
        quantity: i32,
    ) -> AppResult<CustomerCart> {
        auth::require_owner(actor, user_id)?;
        if quantity != 0 {
            validate_quantity(quantity)?;
        }

        let txn = self.store.begin_write()?;
        let mut cart = self.load_txn(&txn, user_id)?;
        if index >= cart.lines.len() {
            return Err(line_not_found(index));
        }
        if quantity == 0 {
            cart.lines.remove(index);
        } else {
            cart.lines[index].quantity = quantity;
        }
        self.save(txn, cart)
    }

    pub fn remove_line(
        &self,
        actor: &Actor,
        user_id: &str,
        index: usize,
    ) -> AppResult<CustomerCart> {
        self.set_quantity(actor, user_id, index, 0)
    }

    pub fn clear(&self, actor: &Actor, user_id: &str) -> AppResult<()> {
        auth::require_owner(actor, user_id)?;
        let txn = self.store.begin_write()?;
        if self.store.remove_txn(&txn, Collection::Carts, user_id)? {
            self.store
                .commit(txn, vec![StoreChange::new(Collection::Carts, user_id)])?;
            tracing::debug!(user_id = %user_id, "Cart cleared");
        }
        Ok(())
    }

    fn load_txn(&self, txn: &redb::WriteTransaction, user_id: &str) -> AppResult<CustomerCart> {
        Ok(self
            .store
            .get_txn::<CustomerCart>(txn, Collection::Carts, user_id)?
            .unwrap_or_else(|| CustomerCart::empty(user_id)))
    }

    fn save(&self, txn: redb::WriteTransaction, mut cart: CustomerCart) -> AppResult<CustomerCart> {
        cart.updated_at = shared::util::now_millis();
        self.store
            .put_txn(&txn, Collection::Carts, &cart.user_id, &cart)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Carts, &cart.user_id)])?;
        Ok(cart)
    }
}

fn normalize_line(mut line: CartLine) -> CartLine {
    line.notes = line
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    line.selected_options = line.selected_options.filter(|opts| !opts.is_empty());
    line
}

fn validate_line(product: &Product, line: &CartLine) -> AppResult<()> {
    if !product.is_active {
        return Err(AppError::with_message(
            ErrorCode::ProductInactive,
            format!("Product is not available: {}", product.name),
        )
        .with_detail("product_id", product.id.clone()));
    }
    validate_quantity(line.quantity)?;
    validate_options(product, &line.selected_options)?;
    if line.notes.as_ref().is_some_and(|n| n.len() > MAX_NOTE_LEN) {
        return Err(AppError::invalid_field("notes", "notes are too long"));
    }
    Ok(())
}

fn same_line(a: &CartLine, b: &CartLine) -> bool {
    a.product_id == b.product_id && a.selected_options == b.selected_options && a.notes == b.notes
}

fn line_not_found(index: usize) -> AppError {
    AppError::with_message(ErrorCode::NotFound, format!("Cart line {index} not found"))
        .with_detail("index", index)
}
