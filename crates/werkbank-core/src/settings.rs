use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store unavailable: {0}")]
    Store(String),
    #[error("setup already completed")]
    AlreadyCompleted,
}

/// The single global settings row owned by the host's master data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WerkbankSettings {
    pub auth_enabled: bool,
    pub base_url: String,
}

/// Read access to the settings row.
///
/// `Ok(None)` means the row does not exist yet (first run); callers treat
/// that as auth disabled.
pub trait SettingsProvider: Send + Sync {
    fn load(&self) -> Result<Option<WerkbankSettings>, SettingsError>;
}

impl<P: SettingsProvider + ?Sized> SettingsProvider for std::sync::Arc<P> {
    fn load(&self) -> Result<Option<WerkbankSettings>, SettingsError> {
        (**self).load()
    }
}

/// Read-through cache so the gateway does not hit the store on every request.
///
/// A provider error serves the last known value when one exists, otherwise
/// reads as "no row" so a broken store cannot lock anyone out.
pub struct CachedSettings<P> {
    inner: P,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Option<WerkbankSettings>)>>,
}

impl<P: SettingsProvider> CachedSettings<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub fn load(&self) -> Option<WerkbankSettings> {
        if let Some((at, value)) = self.cached.read().expect("settings cache poisoned").as_ref() {
            if at.elapsed() < self.ttl {
                return value.clone();
            }
        }
        self.refresh()
    }

    /// Drop the cached value so the next load hits the store.
    pub fn invalidate(&self) {
        *self.cached.write().expect("settings cache poisoned") = None;
    }

    fn refresh(&self) -> Option<WerkbankSettings> {
        let mut guard = self.cached.write().expect("settings cache poisoned");
        match self.inner.load() {
            Ok(value) => {
                *guard = Some((Instant::now(), value.clone()));
                value
            }
            Err(err) => {
                tracing::warn!(error = %err, "settings lookup failed, serving stale value");
                guard.as_ref().and_then(|(_, value)| value.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubProvider {
        loads: AtomicUsize,
        fail: AtomicBool,
        value: Option<WerkbankSettings>,
    }

    impl StubProvider {
        fn new(value: Option<WerkbankSettings>) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                value,
            }
        }
    }

    impl SettingsProvider for &StubProvider {
        fn load(&self) -> Result<Option<WerkbankSettings>, SettingsError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SettingsError::Store("disk on fire".to_string()));
            }
            Ok(self.value.clone())
        }
    }

    fn settings(auth_enabled: bool) -> WerkbankSettings {
        WerkbankSettings {
            auth_enabled,
            base_url: "http://host".to_string(),
        }
    }

    #[test]
    fn serves_from_cache_within_ttl() {
        let stub = StubProvider::new(Some(settings(true)));
        let cached = CachedSettings::new(&stub, Duration::from_secs(60));
        assert_eq!(cached.load(), Some(settings(true)));
        assert_eq!(cached.load(), Some(settings(true)));
        assert_eq!(stub.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_row_is_cached_as_none() {
        let stub = StubProvider::new(None);
        let cached = CachedSettings::new(&stub, Duration::from_secs(60));
        assert_eq!(cached.load(), None);
        assert_eq!(cached.load(), None);
        assert_eq!(stub.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_error_serves_last_known_value() {
        let stub = StubProvider::new(Some(settings(true)));
        let cached = CachedSettings::new(&stub, Duration::from_millis(0));
        assert_eq!(cached.load(), Some(settings(true)));
        stub.fail.store(true, Ordering::SeqCst);
        assert_eq!(cached.load(), Some(settings(true)));
    }

    #[test]
    fn store_error_with_no_history_reads_as_missing() {
        let stub = StubProvider::new(None);
        stub.fail.store(true, Ordering::SeqCst);
        let cached = CachedSettings::new(&stub, Duration::from_secs(60));
        assert_eq!(cached.load(), None);
    }

    #[test]
    fn invalidate_forces_a_fresh_read() {
        let stub = StubProvider::new(Some(settings(false)));
        let cached = CachedSettings::new(&stub, Duration::from_secs(60));
        cached.load();
        cached.invalidate();
        cached.load();
        assert_eq!(stub.loads.load(Ordering::SeqCst), 2);
    }
}
