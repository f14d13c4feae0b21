use std::fmt;

use reqwest::{
    Method, RequestBuilder,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cloudflare::Config;

mod types;
// re-export the wire types, the resource modules refer to them as `cf_client::X`
pub use types::*;

pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com/client/v4";

const X_AUTH_KEY: HeaderName = HeaderName::from_static("x-auth-key");
const X_AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode Cloudflare response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("HTTP status {status}: {}", ResponseInfo::join(.errors))]
    Api { status: u16, errors: Vec<ResponseInfo> },

    #[error("invalid credential header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// HTTP status returned by the API, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether Cloudflare reported `code` among the response errors
    pub fn has_code(&self, code: u32) -> bool {
        match self {
            Error::Api { errors, .. } => errors.iter().any(|e| e.code == code),
            _ => false,
        }
    }

    /// True for a 404, or for any of the given Cloudflare error codes.
    pub fn is_not_found(&self, codes: &[u32]) -> bool {
        self.status() == Some(404) || codes.iter().any(|c| self.has_code(*c))
    }
}

/// A single entry of the `errors` array in a Cloudflare response envelope
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ResponseInfo {
    pub code: u32,
    #[serde(default)]
    pub message: String,
}

impl ResponseInfo {
    fn join(errors: &[ResponseInfo]) -> String {
        if errors.is_empty() {
            return "no error details".to_string();
        }
        errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ResponseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ResponseInfo>,
    #[serde(default)]
    result: Value,
}

/// Thin client for the Cloudflare v4 REST API.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
}

impl CloudflareClient {
    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        match config {
            Config::ApiToken { token } => {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Config::ApiKey { key, email } => {
                let mut value = HeaderValue::from_str(key)?;
                value.set_sensitive(true);
                headers.insert(X_AUTH_KEY, value);
                headers.insert(X_AUTH_EMAIL, HeaderValue::from_str(email)?);
            }
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let _: Value = self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "cloudflare api request");
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let envelope: ApiResponse = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(Error::Decode(e)),
            // error pages from the edge are not always JSON
            Err(_) => {
                return Err(Error::Api {
                    status: status.as_u16(),
                    errors: vec![],
                });
            }
        };
        if !status.is_success() || !envelope.success {
            return Err(Error::Api {
                status: status.as_u16(),
                errors: envelope.errors,
            });
        }
        serde_json::from_value(envelope.result).map_err(Error::Decode)
    }
}
