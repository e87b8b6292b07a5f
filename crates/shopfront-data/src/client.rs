//! Thin JSON client over `reqwest`.

use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{FetchError, Response, TimeoutConfig};

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    base_url: Url,
    timeouts: TimeoutConfig,
}

impl FetchClient {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        // Without a trailing slash `join` would drop the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeouts,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }

    /// Resolve a path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// POST a JSON body and decode a JSON reply.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let body = serde_json::to_vec(body)?;
        let response = self.send(url, Some(body)).await?.error_for_status()?;
        response.json()
    }

    /// POST without a body, ignoring the reply.
    pub async fn post_empty(&self, path: &str) -> Result<(), FetchError> {
        let url = self.endpoint(path)?;
        self.send(url, None).await?.error_for_status()?;
        Ok(())
    }

    async fn send(&self, url: Url, body: Option<Vec<u8>>) -> Result<Response, FetchError> {
        tracing::debug!(%url, "POST");

        let mut request = self
            .client
            .post(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        if !(200..300).contains(&status) {
            tracing::warn!(%url, status, "request rejected");
        }
        Ok(Response::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = FetchClient::new("https://api.example.com/v1", TimeoutConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
        assert_eq!(
            client.endpoint("/orders").unwrap().as_str(),
            "https://api.example.com/v1/orders"
        );
        assert_eq!(
            client.endpoint("orders/o-1/cancel").unwrap().as_str(),
            "https://api.example.com/v1/orders/o-1/cancel"
        );
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(matches!(
            FetchClient::new("not a url", TimeoutConfig::default()),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(FetchClient::new("mailto:ops@example.com", TimeoutConfig::default()).is_err());
    }
}
