//! REST API client for Kraken
//!
//! Only the private session-token endpoint is needed: everything else goes
//! over the WebSocket API.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::auth::generate_auth_headers;
use super::messages::{KrakenResponse, WebSocketsToken};
use crate::common::errors::{Result, TraderError};
use crate::config::ApiCredentials;

const WEBSOCKETS_TOKEN_PATH: &str = "/0/private/GetWebSocketsToken";

/// REST API client for Kraken
#[derive(Debug, Clone)]
pub struct KrakenRestClient {
    /// HTTP client
    client: Client,
    /// Base URL, e.g. `https://api.kraken.com`
    base_url: String,
    /// API credentials for private endpoints
    credentials: Option<ApiCredentials>,
}

impl KrakenRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Set API credentials for authenticated requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Fetch a token for the authenticated WebSocket API
    #[instrument(skip(self))]
    pub async fn get_websockets_token(&self) -> Result<WebSocketsToken> {
        let token: WebSocketsToken = self.private_post(WEBSOCKETS_TOKEN_PATH).await?;
        debug!(expires = token.expires, "obtained websocket token");
        Ok(token)
    }

    async fn private_post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            TraderError::Authentication(format!("{} requires API credentials", path))
        })?;
        let headers = generate_auth_headers(credentials, path, &[])?;

        let url = format!("{}{}", self.base_url, path);
        let response = headers
            .apply_to_request(self.client.post(&url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let body: KrakenResponse<T> = response.json().await?;
        if !body.error.is_empty() {
            return Err(TraderError::ExchangeApi(body.error));
        }
        body.result
            .ok_or_else(|| TraderError::InvalidResponse(format!("{} returned no result", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> ApiCredentials {
        ApiCredentials::new("key".to_string(), BASE64.encode(b"secret"))
    }

    #[tokio::test]
    async fn test_get_websockets_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBSOCKETS_TOKEN_PATH))
            .and(header_exists("API-Key"))
            .and(header_exists("API-Sign"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": [],
                "result": {"token": "abc123", "expires": 900}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = KrakenRestClient::new(&server.uri())
            .unwrap()
            .with_credentials(credentials());

        let token = client.get_websockets_token().await.unwrap();
        assert_eq!(token.token, "abc123");
        assert_eq!(token.expires, 900);
    }

    #[tokio::test]
    async fn test_api_errors_are_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBSOCKETS_TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": ["EAPI:Invalid key"]
            })))
            .mount(&server)
            .await;

        let client = KrakenRestClient::new(&server.uri())
            .unwrap()
            .with_credentials(credentials());

        match client.get_websockets_token().await {
            Err(TraderError::ExchangeApi(errors)) => assert_eq!(errors, vec!["EAPI:Invalid key"]),
            other => panic!("expected ExchangeApi error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_failure_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = KrakenRestClient::new(&server.uri())
            .unwrap()
            .with_credentials(credentials());

        assert!(matches!(
            client.get_websockets_token().await,
            Err(TraderError::InvalidResponse(ref m)) if m.contains("503")
        ));
    }

    #[tokio::test]
    async fn test_token_requires_credentials() {
        let client = KrakenRestClient::new("http://localhost:1").unwrap();
        assert!(!client.has_credentials());
        assert!(matches!(
            client.get_websockets_token().await,
            Err(TraderError::Authentication(_))
        ));
    }
}
