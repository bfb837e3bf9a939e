//! reqwest-backed registry implementation.

use crate::api::{PutAgreementState, Registry};
use crate::error::RegistryError;
use async_trait::async_trait;
use pact_types::DeviceCredentials;
use reqwest::Client;
use tracing::debug;

/// HTTP/1.1 JSON client for the marketplace registry.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: Client,
    base_url: String,
}

impl HttpRegistry {
    /// Creates a client for the registry at `base_url`.
    ///
    /// A trailing slash on the base URL is tolerated.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Returns the agreement resource URL, without the token query.
    ///
    /// The token travels as a query parameter added at request time so
    /// it never appears in logs.
    #[must_use]
    pub fn agreement_url(&self, device_id: &str, agreement_id: &str) -> String {
        format!(
            "{}/devices/{}/agreements/{}",
            self.base_url, device_id, agreement_id
        )
    }

    async fn check(response: reqwest::Response) -> Result<(), RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(RegistryError::Response {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn put_agreement_state(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
        body: PutAgreementState,
    ) -> Result<(), RegistryError> {
        let url = self.agreement_url(&device.device_id, agreement_id);
        debug!(%url, agreement_id, state = %body.state, "registry put");

        let response = self
            .client
            .put(&url)
            .query(&[("token", device.token.as_str())])
            .json(&body)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn delete_agreement(
        &self,
        device: &DeviceCredentials,
        agreement_id: &str,
    ) -> Result<(), RegistryError> {
        let url = self.agreement_url(&device.device_id, agreement_id);
        debug!(%url, agreement_id, "registry delete");

        let response = self
            .client
            .delete(&url)
            .query(&[("token", device.token.as_str())])
            .send()
            .await?;
        Self::check(response).await
    }
}
