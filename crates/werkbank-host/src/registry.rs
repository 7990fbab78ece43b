use std::collections::HashMap;
use std::sync::RwLock;

use werkbank_core::{ModuleInfo, RegistryError};

/// In-memory module roster keyed by module name.
///
/// Registrations fully replace the previous entry (last write wins, no
/// merge) and are idempotent. The map is read on every navigation render
/// and written only on the rare registration, so a plain `RwLock` carries
/// the load fine. Nothing here survives a host restart; modules rebuild the
/// roster through their re-registration heartbeats.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, ModuleInfo>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. The only validation is a usable key; a broken
    /// health-check URL just never reports healthy later.
    pub fn register(&self, info: ModuleInfo) -> Result<(), RegistryError> {
        if info.module_name.trim().is_empty() {
            return Err(RegistryError::EmptyModuleName);
        }
        self.modules
            .write()
            .expect("module registry poisoned")
            .insert(info.module_name.clone(), info);
        Ok(())
    }

    /// No-op when the module was never registered.
    pub fn unregister(&self, name: &str) {
        self.modules
            .write()
            .expect("module registry poisoned")
            .remove(name);
    }

    pub fn get(&self, name: &str) -> Option<ModuleInfo> {
        self.modules
            .read()
            .expect("module registry poisoned")
            .get(name)
            .cloned()
    }

    /// Snapshot in no particular order; callers sort for stable navigation.
    pub fn get_all(&self) -> Vec<ModuleInfo> {
        self.modules
            .read()
            .expect("module registry poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Case-insensitive lookup of the canonical module name, used to map
    /// health-probe paths back to roster entries.
    pub fn canonical_name(&self, name: &str) -> Option<String> {
        self.modules
            .read()
            .expect("module registry poisoned")
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }
}
