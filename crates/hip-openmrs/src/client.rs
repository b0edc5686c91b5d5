//! Async HTTP client for the OpenMRS REST and FHIR APIs.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result};

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenMrsConfig {
  /// Base URL, e.g. `https://bahmni.example.org/openmrs`.
  pub url:          String,
  pub username:     String,
  pub password:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenMrsClient {
  client: Client,
  config: OpenMrsConfig,
}

impl OpenMrsClient {
  pub fn new(config: OpenMrsConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.config.url.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }

  /// `GET` a registry path and decode the JSON body.
  pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
    self
      .get_optional(path, query)
      .await?
      .ok_or(Error::UnexpectedStatus { status: StatusCode::NOT_FOUND.as_u16(), body: String::new() })
  }

  /// Like [`Self::get`], but a `404` yields `None`.
  pub async fn get_optional<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
  ) -> Result<Option<T>> {
    let resp = self
      .client
      .get(self.url(path))
      .basic_auth(&self.config.username, Some(&self.config.password))
      .query(query)
      .send()
      .await?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let body = resp.text().await?;
    if !status.is_success() {
      tracing::error!(%status, %body, path, "openmrs request failed");
      return Err(Error::UnexpectedStatus { status: status.as_u16(), body });
    }
    Ok(Some(serde_json::from_str(&body)?))
  }
}
