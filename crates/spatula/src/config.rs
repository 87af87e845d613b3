use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: Option<f32>,

    /// Verify TLS certificates
    #[serde(default = "default_verify")]
    pub verify: bool,

    /// Where dated output directories are created when none is given
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            verify: default_verify(),
            output_root: default_output_root(),
        }
    }
}

impl ScraperConfig {
    /// Zero, negative and out of range timeouts mean none, see
    /// [`ScraperConfig::validate`] to reject the latter.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0.)
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.timeout.filter(|secs| *secs > 0.) {
            Duration::try_from_secs_f32(secs)
                .map_err(|e| Error::Config(format!("timeout {secs}: {e}")))?;
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("spatula {}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> Option<f32> {
    None
}

fn default_verify() -> bool {
    true
}

fn default_output_root() -> PathBuf {
    PathBuf::from("_scrapes")
}
