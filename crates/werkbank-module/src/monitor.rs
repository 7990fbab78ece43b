use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use werkbank_core::ModuleInfo;

use crate::registrar::Registrar;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Grace period at process start so the host has a chance to come up
    /// before the first registration attempt.
    pub startup_delay: Duration,
    /// How often the monitor wakes up; must stay below the staleness window.
    pub tick: Duration,
    /// How long the monitor tolerates silence before re-announcing.
    pub staleness_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(2),
            tick: Duration::from_secs(15),
            staleness_timeout: Duration::from_secs(60),
        }
    }
}

/// Inbound evidence that the host still knows this module.
///
/// The module's own `/health` handler calls [`HealthPulse::touch`] on every
/// probe; the monitor treats a recent pulse as confirmation that its
/// registration is intact.
#[derive(Default)]
pub struct HealthPulse {
    last: RwLock<Option<Instant>>,
}

impl HealthPulse {
    pub fn touch(&self) {
        *self.last.write().expect("health pulse poisoned") = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.last
            .read()
            .expect("health pulse poisoned")
            .map(|at| at.elapsed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorState {
    Announced,
    Stale,
}

/// Module-side self-healing heartbeat.
///
/// The host keeps its roster in memory only, so a host restart silently
/// forgets every module. This task watches for the absence of confirmation
/// (a successful registration or an inbound health probe) and re-announces
/// the module whenever the silence exceeds the staleness window. Starts in
/// the stale state so the very first tick registers.
pub struct ModuleHealthMonitor<R, F> {
    config: MonitorConfig,
    registrar: R,
    info_factory: F,
    pulse: Arc<HealthPulse>,
    shutdown: watch::Receiver<bool>,
}

impl<R, F> ModuleHealthMonitor<R, F>
where
    R: Registrar + Send + Sync + 'static,
    F: Fn() -> ModuleInfo + Send + Sync + 'static,
{
    pub fn new(
        config: MonitorConfig,
        registrar: R,
        info_factory: F,
        pulse: Arc<HealthPulse>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            registrar,
            info_factory,
            pulse,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.config.startup_delay) => {}
            _ = self.shutdown.changed() => return,
        }

        let mut state = MonitorState::Stale;
        let mut last_success: Option<Instant> = None;
        let mut interval = tokio::time::interval(self.config.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.shutdown.changed() => break,
            }

            if self.confirmation_elapsed(last_success) > self.config.staleness_timeout {
                state = MonitorState::Stale;
            }
            if state == MonitorState::Announced {
                continue;
            }

            let info = (self.info_factory)();
            match self.registrar.register(&info).await {
                Ok(()) => {
                    tracing::info!(module = %info.module_name, version = %info.version, "registered with host");
                    state = MonitorState::Announced;
                    last_success = Some(Instant::now());
                }
                Err(err) => {
                    tracing::warn!(module = %info.module_name, error = %err, "registration failed, retrying on next tick");
                }
            }
        }
    }

    /// Time since the freshest confirmation from either channel. With no
    /// confirmation at all the module counts as stale forever.
    fn confirmation_elapsed(&self, last_success: Option<Instant>) -> Duration {
        let success = last_success.map(|at| at.elapsed());
        let pulse = self.pulse.elapsed();
        match (success, pulse) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => Duration::MAX,
        }
    }
}
