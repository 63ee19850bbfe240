//! Store settings (店铺设置，单例文档)

use crate::auth::{self, permissions};
use crate::store::{Collection, Store, StoreChange};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_URL_LEN, validate_non_negative, validate_optional_text,
};
use shared::error::{AppError, AppResult};
use shared::models::{Actor, StoreSettings};

/// Key of the singleton document in the settings collection
pub const SETTINGS_KEY: &str = "main";

#[derive(Debug, Clone)]
pub struct SettingsService {
    store: Store,
}

impl SettingsService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Current settings, defaults if never written
    pub fn get(&self) -> AppResult<StoreSettings> {
        Ok(self
            .store
            .get::<StoreSettings>(Collection::Settings, SETTINGS_KEY)?
            .unwrap_or_default())
    }

    /// Replace the settings (admin)
    pub fn update(&self, actor: &Actor, mut settings: StoreSettings) -> AppResult<StoreSettings> {
        auth::require_permission(actor, permissions::SETTINGS_MANAGE)?;

        settings.store_name = settings.store_name.trim().to_string();
        settings.banner_url = settings
            .banner_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if settings.store_name.len() > MAX_NAME_LEN {
            return Err(AppError::invalid_field("store_name", "store name is too long"));
        }
        validate_optional_text(&settings.banner_url, "banner_url", MAX_URL_LEN)?;
        validate_non_negative(settings.default_delivery_fee, "default_delivery_fee")?;

        let txn = self.store.begin_write()?;
        self.store
            .put_txn(&txn, Collection::Settings, SETTINGS_KEY, &settings)?;
        self.store
            .commit(txn, vec![StoreChange::new(Collection::Settings, SETTINGS_KEY)])?;

        tracing::info!(updated_by = %actor.user_id, "Store settings updated");
        Ok(settings)
    }
}
