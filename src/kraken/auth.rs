//! Authentication utilities for the Kraken REST API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use crate::common::errors::{Result, TraderError};
use crate::config::ApiCredentials;

type HmacSha512 = Hmac<Sha512>;

/// Generate the `API-Sign` value for a private REST call
///
/// `HMAC-SHA512(base64_decode(secret), path || SHA256(nonce || post_data))`,
/// base64 encoded.
///
/// # Arguments
/// * `secret` - API secret (base64 encoded)
/// * `path` - URI path, e.g. `/0/private/GetWebSocketsToken`
/// * `nonce` - Strictly increasing nonce, also present in `post_data`
/// * `post_data` - URL-encoded request body
pub fn sign_request(secret: &str, path: &str, nonce: u64, post_data: &str) -> Result<String> {
    let secret_bytes = BASE64
        .decode(secret)
        .map_err(|e| TraderError::Authentication(format!("Failed to decode secret: {}", e)))?;

    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(post_data.as_bytes());
    let digest = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(&secret_bytes)
        .map_err(|e| TraderError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Generate a nonce and signature for a private REST call
///
/// `extra_params` are appended to the body after the nonce.
pub fn generate_auth_headers(
    credentials: &ApiCredentials,
    path: &str,
    extra_params: &[(&str, &str)],
) -> Result<AuthHeaders> {
    let nonce = chrono::Utc::now().timestamp_millis() as u64;

    let mut post_data = format!("nonce={}", nonce);
    for (key, value) in extra_params {
        post_data.push_str(&format!("&{}={}", key, value));
    }

    let signature = sign_request(&credentials.api_secret, path, nonce, &post_data)?;

    Ok(AuthHeaders {
        api_key: credentials.api_key.clone(),
        signature,
        nonce,
        post_data,
    })
}

/// Signed request material for one private REST call
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub nonce: u64,
    /// Body that was signed; must be sent unchanged
    pub post_data: String,
}

impl AuthHeaders {
    /// Add the headers and signed body to a reqwest RequestBuilder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("API-Key", &self.api_key)
            .header("API-Sign", &self.signature)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(self.post_data.clone())
    }
}
