//! [`HttpGateway`]: delivers callback envelopes to the consent-manager
//! gateway over HTTP.

use std::time::Duration;

use hip_core::gateway::Gateway;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Header naming the consumer manager a callback is routed to.
pub const CM_ID_HEADER: &str = "X-CM-ID";

fn default_timeout_secs() -> u64 { 30 }

fn default_cm_id() -> String { "sbx".to_owned() }

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  pub url:          String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Consumer manager to answer when a failed request carries no patient id.
  #[serde(default = "default_cm_id")]
  pub cm_id:        String,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpGateway {
  client:   Client,
  base_url: String,
}

impl HttpGateway {
  pub fn new(config: &GatewayConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, base_url: config.url.trim_end_matches('/').to_owned() })
  }
}

impl Gateway for HttpGateway {
  type Error = Error;

  async fn send<T>(&self, path: &str, envelope: &T, consumer_suffix: &str) -> Result<()>
  where
    T: Serialize + Sync,
  {
    let resp = self
      .client
      .post(format!("{}{path}", self.base_url))
      .header(CM_ID_HEADER, consumer_suffix)
      .json(envelope)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::GatewayStatus { status: status.as_u16(), body });
    }
    tracing::debug!(path, %status, "callback delivered");
    Ok(())
  }
}
