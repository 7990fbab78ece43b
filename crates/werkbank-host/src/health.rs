use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use werkbank_core::time::Clock;

use crate::registry::ModuleRegistry;
use crate::state::AppState;

/// A module counts as stale after a minute of silence.
pub const HEALTH_TIMEOUT_MS: u64 = 60_000;

/// Last-seen timestamps per module, fed passively by inbound health probes.
///
/// The host never polls modules; a record only moves when traffic arrives.
/// Later pings overwrite earlier ones on arrival order, and records are
/// never deleted, they just go stale.
pub struct HealthTracker {
    clock: Arc<dyn Clock>,
    seen: RwLock<HashMap<String, u64>>,
}

impl HealthTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            seen: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, module: &str) {
        let now = self.clock.now_millis();
        self.seen
            .write()
            .expect("health tracker poisoned")
            .insert(module.to_string(), now);
    }

    pub fn last_seen(&self, module: &str) -> Option<u64> {
        self.seen
            .read()
            .expect("health tracker poisoned")
            .get(module)
            .copied()
    }

    /// Absent records are stale; that is what triggers a module's
    /// re-registration after a host restart.
    pub fn is_stale(&self, module: &str, timeout_ms: u64) -> bool {
        match self.last_seen(module) {
            Some(at) => self.clock.now_millis().saturating_sub(at) > timeout_ms,
            None => true,
        }
    }
}

/// Middleware: any request hitting a module health path refreshes that
/// module's record as a side effect of routing.
pub async fn track_health<B>(State(state): State<AppState>, req: Request<B>, next: Next<B>) -> Response {
    if let Some(module) = health_target(req.uri().path(), &state.registry) {
        state.health.record(&module);
    }
    next.run(req).await
}

/// Maps a request path to the module it is health-probing, if any.
///
/// Convention: `/<module>/health`, matched case-insensitively against the
/// roster so the record lands under the registered name. A probe for a
/// module the host no longer knows is still recorded under the path
/// segment, since that module's re-registration will arrive under the same
/// name.
fn health_target(path: &str, registry: &ModuleRegistry) -> Option<String> {
    let mut segments = path.trim_matches('/').split('/');
    let module = segments.next().filter(|s| !s.is_empty())?;
    if segments.next() != Some("health") || segments.next().is_some() {
        return None;
    }
    if module.eq_ignore_ascii_case("api") {
        return None;
    }
    Some(
        registry
            .canonical_name(module)
            .unwrap_or_else(|| module.to_string()),
    )
}
