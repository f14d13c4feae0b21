use std::{collections::HashMap, fmt, sync::Arc};

use k8s_openapi::api::core::v1::{Secret, SecretKeySelector};
use kube::{Api, Client};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    Error, Result,
    cf_client::{CloudflareClient, DEFAULT_API_URL},
};

/// Credentials for the Cloudflare API
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Config {
    ApiKey { key: String, email: String },
    ApiToken { token: String },
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Config::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("key", &"<redacted>")
                .field("email", email)
                .finish(),
            Config::ApiToken { .. } => f.debug_struct("ApiToken").field("token", &"<redacted>").finish(),
        }
    }
}

/// JSON payload stored in a credentials secret
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProviderSecret {
    api_key: Option<String>,
    email: Option<String>,
    token: Option<String>,
}

/// Parse a credentials secret payload.
///
/// A complete key + email pair wins over a token when both are present.
pub fn use_provider_secret(data: &[u8]) -> Result<Config> {
    let secret: ProviderSecret = serde_json::from_slice(data).map_err(Error::InvalidProviderSecret)?;
    match secret {
        ProviderSecret {
            api_key: Some(key),
            email: Some(email),
            ..
        } => Ok(Config::ApiKey { key, email }),
        ProviderSecret { token: Some(token), .. } => Ok(Config::ApiToken { token }),
        _ => Err(Error::NoAuth),
    }
}

/// Client for the public Cloudflare API
pub fn new_client(config: &Config) -> Result<CloudflareClient> {
    new_client_at(config, DEFAULT_API_URL)
}

pub fn new_client_at(config: &Config, api_url: &str) -> Result<CloudflareClient> {
    CloudflareClient::with_base_url(config, api_url).map_err(Error::ClientCreation)
}

type ClientCache = Arc<Mutex<HashMap<Config, Arc<CloudflareClient>>>>;

/// Resolves the credentials of a managed resource and hands out a shared client per credential.
#[derive(Clone)]
pub struct CloudflareClientProvider {
    k8s_client: Client,
    default_config: Option<Config>,
    api_url: String,
    cache: ClientCache,
}

impl CloudflareClientProvider {
    pub fn new(k8s_client: Client, default_config: Option<Config>, api_url: impl Into<String>) -> Self {
        Self {
            k8s_client,
            default_config,
            api_url: api_url.into(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Client for a resource in `namespace`, using its secret reference or the operator default
    pub async fn get_client(
        &self,
        secret_ref: Option<&SecretKeySelector>,
        namespace: &str,
    ) -> Result<Arc<CloudflareClient>> {
        let config = match secret_ref {
            Some(selector) => self.read_secret(selector, namespace).await?,
            None => self.default_config.clone().ok_or(Error::NoAuth)?,
        };
        self.get_client_from_cache(config).await
    }

    async fn get_client_from_cache(&self, config: Config) -> Result<Arc<CloudflareClient>> {
        let mut cache = self.cache.lock().await;

        if let Some(client) = cache.get(&config) {
            return Ok(client.clone());
        }

        debug!(credentials = ?config, "creating cloudflare client");
        let client = Arc::new(new_client_at(&config, &self.api_url)?);
        cache.insert(config, client.clone());

        Ok(client)
    }

    async fn read_secret(&self, selector: &SecretKeySelector, namespace: &str) -> Result<Config> {
        let secrets: Api<Secret> = Api::namespaced(self.k8s_client.clone(), namespace);
        let secret = secrets
            .get_opt(&selector.name)
            .await
            .map_err(Error::KubeError)?
            .ok_or_else(|| Error::SecretNotFound(selector.name.clone()))?;

        let payload = secret
            .data
            .as_ref()
            .and_then(|data| data.get(&selector.key))
            .ok_or_else(|| Error::SecretKeyMissing(selector.key.clone()))?;

        use_provider_secret(&payload.0)
    }
}
