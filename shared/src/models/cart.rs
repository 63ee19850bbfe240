//! Customer cart (persisted between visits of the digital menu)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCart {
    pub user_id: String,
    pub lines: Vec<CartLine>,
    pub updated_at: i64,
}

impl CustomerCart {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            lines: Vec::new(),
            updated_at: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
