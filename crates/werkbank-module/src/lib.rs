pub mod health;
pub mod monitor;
pub mod registrar;

pub use health::health_router;
pub use monitor::{HealthPulse, ModuleHealthMonitor, MonitorConfig};
pub use registrar::{HttpRegistrar, RegisterError, Registrar};
