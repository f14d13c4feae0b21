use std::{env, str::FromStr, time::Duration};

use tracing::warn;

use crate::{cf_client, cloudflare::Config};

/// Operator settings read from the environment at startup
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Credentials used when a resource has no `credentialsSecretRef`
    pub credentials: Option<Config>,
    pub api_url: String,
    /// Requeue interval for resources that reconciled cleanly
    pub poll_interval: Duration,
    /// Requeue interval after a failed reconcile
    pub error_requeue: Duration,
    pub max_concurrent_reconciles: u16,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            api_url: cf_client::DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(5 * 60),
            error_requeue: Duration::from_secs(5 * 60),
            max_concurrent_reconciles: 5,
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let credentials = match (
            lookup("CLOUDFLARE_API_KEY"),
            lookup("CLOUDFLARE_EMAIL"),
            lookup("CLOUDFLARE_API_TOKEN"),
        ) {
            (Some(key), Some(email), _) => Some(Config::ApiKey { key, email }),
            (_, _, Some(token)) => Some(Config::ApiToken { token }),
            _ => None,
        };
        if credentials.is_none() {
            warn!("no default Cloudflare credentials, every resource needs a credentialsSecretRef");
        }

        Self {
            credentials,
            api_url: lookup("CLOUDFLARE_API_URL").unwrap_or(defaults.api_url),
            poll_interval: parse(&lookup, "RECONCILE_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            error_requeue: parse(&lookup, "ERROR_REQUEUE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.error_requeue),
            max_concurrent_reconciles: parse(&lookup, "MAX_CONCURRENT_RECONCILES")
                .unwrap_or(defaults.max_concurrent_reconciles),
        }
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparsable {key}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> OperatorConfig {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        OperatorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let c = config(&[]);
        assert!(c.credentials.is_none());
        assert_eq!(c.api_url, cf_client::DEFAULT_API_URL);
        assert_eq!(c.poll_interval, Duration::from_secs(300));
        assert_eq!(c.max_concurrent_reconciles, 5);
    }

    #[test]
    fn key_pair_preferred_over_token() {
        let c = config(&[
            ("CLOUDFLARE_API_KEY", "k"),
            ("CLOUDFLARE_EMAIL", "ops@example.com"),
            ("CLOUDFLARE_API_TOKEN", "t"),
        ]);
        assert_eq!(c.credentials, Some(Config::ApiKey {
            key: "k".into(),
            email: "ops@example.com".into()
        }));
    }

    #[test]
    fn token_and_overrides() {
        let c = config(&[
            ("CLOUDFLARE_API_TOKEN", "t"),
            ("RECONCILE_INTERVAL_SECS", "60"),
            ("MAX_CONCURRENT_RECONCILES", "nope"),
        ]);
        assert_eq!(c.credentials, Some(Config::ApiToken { token: "t".into() }));
        assert_eq!(c.poll_interval, Duration::from_secs(60));
        assert_eq!(c.max_concurrent_reconciles, 5);
    }
}
