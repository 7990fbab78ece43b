use std::future::Future;
use std::time::Duration;

use werkbank_core::ModuleInfo;

/// Cap on a single registration attempt so an unreachable host cannot hang
/// the monitor loop.
const REGISTER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("host unreachable: {0}")]
    Transport(String),
    #[error("host rejected registration with status {0}")]
    Rejected(u16),
}

/// Transport used by the health monitor to announce the module.
pub trait Registrar: Send + Sync {
    fn register(
        &self,
        info: &ModuleInfo,
    ) -> impl Future<Output = Result<(), RegisterError>> + Send;
}

/// Posts the module's `ModuleInfo` to the host's registration endpoint.
pub struct HttpRegistrar {
    client: reqwest::Client,
    register_url: String,
}

impl HttpRegistrar {
    pub fn new(host_base_url: &str) -> Result<Self, RegisterError> {
        let client = reqwest::Client::builder()
            .timeout(REGISTER_TIMEOUT)
            .build()
            .map_err(|e| RegisterError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            register_url: format!(
                "{}/api/modules/register",
                host_base_url.trim_end_matches('/')
            ),
        })
    }
}

impl Registrar for HttpRegistrar {
    async fn register(&self, info: &ModuleInfo) -> Result<(), RegisterError> {
        let response = self
            .client
            .post(&self.register_url)
            .json(info)
            .send()
            .await
            .map_err(|e| RegisterError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RegisterError::Rejected(response.status().as_u16()))
        }
    }
}
