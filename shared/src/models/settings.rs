//! Store settings (单例)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub store_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    /// Delivery fee suggested for new delivery orders
    #[serde(default)]
    pub default_delivery_fee: Decimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: String::new(),
            banner_url: None,
            default_delivery_fee: Decimal::ZERO,
        }
    }
}
