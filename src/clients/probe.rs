use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::clients::traits::UrlProbe;
use crate::error::{Result, ValidatorError};

/// HEAD-request reachability probe
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hacs-validator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ValidatorError::Config {
                message: format!("Failed to build probe HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn exists(&self, url: &str) -> Result<bool> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| ValidatorError::Http {
                message: format!("Failed checking {}: {}", url, e),
            })?;
        debug!("HEAD {} -> {}", url, resp.status());
        Ok(resp.status().is_success())
    }
}
