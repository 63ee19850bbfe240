//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// Products are soft-deleted: deactivation clears `is_active`, the record
/// stays so that historical orders can still be joined against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Category name (denormalised, may dangle after the category is deleted)
    pub category: String,
    /// Unit price, never negative
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_groups: Vec<OptionGroup>,
    /// 需要后厨制作 (kitchen item)
    #[serde(default)]
    pub requires_preparation: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl Product {
    pub fn option_group(&self, name: &str) -> Option<&OptionGroup> {
        self.option_groups.iter().find(|g| g.name == name)
    }
}

/// Option group (e.g. "Massa": fina / grossa)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub choices: Vec<String>,
}

impl OptionGroup {
    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}

/// Create / update product payload
///
/// `id = None` creates a new product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
    #[serde(default)]
    pub requires_preparation: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}
