//! Catalog - products and categories
//!
//! Reference data for the order engine. Reads are open to every role,
//! writes require `menu:manage` (admin).
//!
//! Products are never hard-deleted; categories are deleted without
//! cascading, products keep the (now dangling) category name.

mod seed;

use crate::auth::{self, permissions};
use crate::store::{Collection, Store, StoreChange};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_non_negative, validate_required_text,
};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Actor, Category, OptionGroup, Product, ProductUpsert};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    // ========== Reads ==========

    /// Active products, ordered by sort order then name
    pub fn list_active(&self) -> AppResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .store
            .list::<Product>(Collection::Products)?
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        sort_products(&mut products);
        Ok(products)
    }

    /// All products including deactivated ones (admin)
    pub fn list_all(&self, actor: &Actor) -> AppResult<Vec<Product>> {
        auth::require_permission(actor, permissions::MENU_MANAGE)?;
        let mut products: Vec<Product> = self.store.list(Collection::Products)?;
        sort_products(&mut products);
        Ok(products)
    }

    pub fn get_product(&self, product_id: &str) -> AppResult<Product> {
        self.store
            .get::<Product>(Collection::Products, product_id)?
            .ok_or_else(|| product_not_found(product_id))
    }

    /// Categories by display order ascending
    pub fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.store.list(Collection::Categories)?;
        categories.sort_by_key(|c| c.display_order);
        Ok(categories)
    }

    // ========== Writes ==========

    /// Create (id = None) or replace a product
    pub fn upsert_product(&self, actor: &Actor, input: ProductUpsert) -> AppResult<Product> {
        auth::require_permission(actor, permissions::MENU_MANAGE)?;
        validate_product(&input)?;

        let txn = self.store.begin_write()?;
        let id = match input.id {
            Some(id) => {
                if self
                    .store
                    .get_txn::<Product>(&txn, Collection::Products, &id)?
                    .is_none()
                {
                    return Err(product_not_found(&id));
                }
                id
            }
            None => shared::util::new_id(),
        };

        let product = Product {
            id: id.clone(),
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            price: input.price,
            image: input.image,
            is_active: input.is_active,
            ingredients: input.ingredients,
            option_groups: input.option_groups,
            requires_preparation: input.requires_preparation,
            sort_order: input.sort_order,
        };
        self.store
            .put_txn(&txn, Collection::Products, &id, &product)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Products, &id)])?;

        tracing::info!(product_id = %id, name = %product.name, "Product saved");
        Ok(product)
    }

    /// Soft delete
    pub fn deactivate_product(&self, actor: &Actor, product_id: &str) -> AppResult<Product> {
        auth::require_permission(actor, permissions::MENU_MANAGE)?;

        let txn = self.store.begin_write()?;
        let mut product = self
            .store
            .get_txn::<Product>(&txn, Collection::Products, product_id)?
            .ok_or_else(|| product_not_found(product_id))?;
        product.is_active = false;
        self.store
            .put_txn(&txn, Collection::Products, product_id, &product)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Products, product_id)])?;

        tracing::info!(product_id = %product_id, "Product deactivated");
        Ok(product)
    }

    /// Add a category at the end of the display order (max + 1, or 1)
    pub fn add_category(&self, actor: &Actor, name: &str) -> AppResult<Category> {
        auth::require_permission(actor, permissions::MENU_MANAGE)?;
        validate_required_text(name, "name", MAX_NAME_LEN)?;
        let name = name.trim();

        let txn = self.store.begin_write()?;
        let existing: Vec<Category> = self.store.list_txn(&txn, Collection::Categories)?;
        if existing.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(AppError::with_message(
                ErrorCode::AlreadyExists,
                format!("Category {name} already exists"),
            )
            .with_detail("field", "name"));
        }
        let display_order = existing
            .iter()
            .map(|c| c.display_order)
            .max()
            .map_or(1, |max| max + 1);

        let category = Category {
            id: shared::util::new_id(),
            name: name.to_string(),
            display_order,
        };
        self.store
            .put_txn(&txn, Collection::Categories, &category.id, &category)?;
        self.store.commit(
            txn,
            vec![StoreChange::new(Collection::Categories, &category.id)],
        )?;

        tracing::info!(category = %category.name, display_order, "Category added");
        Ok(category)
    }

    /// Delete a category; products referencing it by name are left untouched
    pub fn delete_category(&self, actor: &Actor, category_id: &str) -> AppResult<()> {
        auth::require_permission(actor, permissions::MENU_MANAGE)?;

        let txn = self.store.begin_write()?;
        if !self
            .store
            .remove_txn(&txn, Collection::Categories, category_id)?
        {
            return Err(AppError::with_message(
                ErrorCode::CategoryNotFound,
                format!("Category {category_id} not found"),
            ));
        }
        self.store.commit(
            txn,
            vec![StoreChange::new(Collection::Categories, category_id)],
        )?;

        tracing::info!(category_id = %category_id, "Category deleted");
        Ok(())
    }

    /// Insert the initial menu when the catalog is empty
    ///
    /// Returns the number of products inserted (0 when products exist).
    pub fn seed_products(&self) -> AppResult<usize> {
        let txn = self.store.begin_write()?;
        let existing: Vec<Product> = self.store.list_txn(&txn, Collection::Products)?;
        if !existing.is_empty() {
            return Ok(0);
        }

        let mut changes = Vec::new();
        let categories: Vec<Category> = self.store.list_txn(&txn, Collection::Categories)?;
        if categories.is_empty() {
            for category in seed::categories() {
                self.store
                    .put_txn(&txn, Collection::Categories, &category.id, &category)?;
                changes.push(StoreChange::new(Collection::Categories, &category.id));
            }
        }

        let products = seed::products();
        for product in &products {
            self.store
                .put_txn(&txn, Collection::Products, &product.id, product)?;
            changes.push(StoreChange::new(Collection::Products, &product.id));
        }
        self.store.commit(txn, changes)?;

        tracing::info!(count = products.len(), "Seeded initial menu");
        Ok(products.len())
    }
}

pub(crate) fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn product_not_found(product_id: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ProductNotFound,
        format!("Product {product_id} not found"),
    )
    .with_detail("product_id", product_id)
}

/// name non-empty, price >= 0, option groups named with at least one choice
pub fn validate_product(input: &ProductUpsert) -> AppResult<()> {
    validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
    validate_non_negative(input.price, "price")?;
    if input.description.len() > MAX_NOTE_LEN {
        return Err(AppError::invalid_field("description", "description is too long"));
    }
    if input.image.len() > MAX_URL_LEN {
        return Err(AppError::invalid_field("image", "image is too long"));
    }
    validate_option_groups(&input.option_groups)
}

fn validate_option_groups(groups: &[OptionGroup]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for group in groups {
        validate_required_text(&group.name, "option_groups.name", MAX_NAME_LEN)?;
        if !seen.insert(group.name.as_str()) {
            return Err(AppError::invalid_field(
                "option_groups.name",
                format!("Option group {} is defined twice", group.name),
            ));
        }
        if group.choices.is_empty() {
            return Err(AppError::invalid_field(
                "option_groups.choices",
                format!("Option group {} needs at least one choice", group.name),
            ));
        }
        if group.choices.iter().any(|c| c.trim().is_empty()) {
            return Err(AppError::invalid_field(
                "option_groups.choices",
                format!("Option group {} has an empty choice", group.name),
            ));
        }
    }
    Ok(())
}
