use std::sync::Arc;

use werkbank_core::{CachedSettings, SettingsProvider};
use werkbank_db::SqliteSettings;

use crate::health::HealthTracker;
use crate::registry::ModuleRegistry;
use crate::token::TokenValidator;

pub type SharedSettings = CachedSettings<Arc<dyn SettingsProvider>>;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModuleRegistry>,
    pub health: Arc<HealthTracker>,
    /// Read path for the gateway: cached, fail-open.
    pub settings: Arc<SharedSettings>,
    /// Write path for first-run setup.
    pub store: Arc<SqliteSettings>,
    pub validator: Arc<TokenValidator>,
}
