pub mod errors;
pub mod module;
pub mod principal;
pub mod settings;
pub mod time;

pub use errors::RegistryError;
pub use module::{ModuleInfo, NavItem, NavKind};
pub use principal::{Claims, Principal, ADMIN_ROLE, INTERNAL_MODULE_NAME};
pub use settings::{CachedSettings, SettingsError, SettingsProvider, WerkbankSettings};
