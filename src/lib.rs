use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use chrono::{DateTime, Utc};
use kube::{
    client::Client,
    runtime::events::{Recorder, Reporter},
};

use cloudflare::CloudflareClientProvider;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),

    #[error("Finalizer Error: {0}")]
    // NB: awkward type because finalizer::Error embeds the reconciler error (which is this)
    // so boxing this error to break cycles
    FinalizerError(#[source] Box<kube::runtime::finalizer::Error<Error>>),

    #[error("{context}: {source}")]
    Cloudflare {
        context: &'static str,
        #[source]
        source: cf_client::Error,
    },

    #[error("cannot create Cloudflare client: {0}")]
    ClientCreation(#[source] cf_client::Error),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(#[from] std::net::AddrParseError),

    #[error("resource is not namespaced")]
    MissingNamespace,

    #[error("no zone found")]
    NoZone,

    #[error("no filter found")]
    NoFilter,

    #[error("no origin found")]
    NoOrigin,

    #[error("resource has not been created, external name is not set")]
    NotCreated,

    #[error("filter create returned {0} results, expected exactly one")]
    FilterCreateCount(usize),

    #[error("firewall rule create returned {0} results, expected exactly one")]
    RuleCreateCount(usize),

    #[error("no Cloudflare credentials: need an API token, or an API key and email")]
    NoAuth,

    #[error("invalid credentials payload: {0}")]
    InvalidProviderSecret(#[source] serde_json::Error),

    #[error("credentials secret {0} not found")]
    SecretNotFound(String),

    #[error("credentials secret has no key {0}")]
    SecretKeyMissing(String),
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn metric_label(&self) -> String {
        format!("{self:?}").to_lowercase()
    }

    /// Wrap a Cloudflare API failure with the operation that produced it
    pub fn cloudflare(context: &'static str, source: cf_client::Error) -> Self {
        Error::Cloudflare { context, source }
    }
}

/// Diagnostics to be exposed by the web server
#[derive(Clone, Serialize)]
pub struct Diagnostics {
    pub last_event: DateTime<Utc>,
    #[serde(skip)]
    pub reporter: Reporter,
}
impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            last_event: Utc::now(),
            reporter: "cloudflare-provider".into(),
        }
    }
}
impl Diagnostics {
    fn recorder(&self, client: Client) -> Recorder {
        Recorder::new(client, self.reporter.clone())
    }
}

/// State shared between the controllers and the web server
#[derive(Clone, Default)]
pub struct State {
    /// Diagnostics populated by the reconcilers
    diagnostics: Arc<RwLock<Diagnostics>>,
    /// Metrics
    metrics: Arc<Metrics>,
}

/// State wrapper around the controller outputs for the web server
impl State {
    /// Metrics getter
    pub fn metrics(&self) -> String {
        let mut buffer = String::new();
        let registry = &*self.metrics.registry;
        if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, registry) {
            tracing::warn!("failed to encode metrics: {e}");
        }
        buffer
    }

    /// State getter
    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    // Create a Controller Context that can update State
    pub async fn to_context(&self, client: Client, config: OperatorConfig) -> Arc<Context> {
        Arc::new(Context {
            client: client.clone(),
            recorder: self.diagnostics.read().await.recorder(client.clone()),
            metrics: self.metrics.clone(),
            diagnostics: self.diagnostics.clone(),
            provider: CloudflareClientProvider::new(client, config.credentials.clone(), config.api_url.clone()),
            config,
        })
    }
}

// Context for our reconcilers
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Event recorder
    pub recorder: Recorder,
    /// Diagnostics read by the web server
    pub diagnostics: Arc<RwLock<Diagnostics>>,
    /// Prometheus metrics
    pub metrics: Arc<Metrics>,
    /// Cloudflare clients keyed by credentials
    pub provider: CloudflareClientProvider,
    pub config: OperatorConfig,
}

/// Run every controller; one stopping (e.g. its CRD is missing) leaves the others running
pub async fn run(state: State, client: Client, config: OperatorConfig) {
    let ctx = state.to_context(client, config).await;
    tokio::join!(
        managed::run::<zone::Zone>(ctx.clone()),
        managed::run::<dns_record::DNSRecord>(ctx.clone()),
        managed::run::<filter::Filter>(ctx.clone()),
        managed::run::<firewall_rule::FirewallRule>(ctx.clone()),
        managed::run::<spectrum_application::SpectrumApplication>(ctx.clone()),
        managed::run::<custom_hostname::CustomHostname>(ctx.clone()),
        managed::run::<fallback_origin::FallbackOrigin>(ctx.clone()),
        managed::run::<worker_route::WorkerRoute>(ctx.clone()),
    );
}

/// Log and trace integrations
pub mod telemetry;

/// Metrics
mod metrics;
pub use metrics::Metrics;

mod config;
pub use config::OperatorConfig;

pub mod cf_client;
pub mod cloudflare;
pub mod managed;

pub mod custom_hostname;
pub mod dns_record;
pub mod fallback_origin;
pub mod filter;
pub mod firewall_rule;
pub mod spectrum_application;
pub mod worker_route;
pub mod zone;

#[cfg(test)]
pub mod fixtures;

#[cfg(test)]
mod test {
    use super::*;
    use http::{Request, Response};
    use kube::client::Body;
    use std::time::Duration;

    #[tokio::test]
    async fn missing_crd_leaves_other_controllers_running() {
        let (mock_service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        let (rejected_tx, mut rejected_rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            // keep the other kinds' list calls pending
            let mut pending = vec![];
            while let Some((request, send)) = handle.next_request().await {
                if request.uri().path() == "/apis/cloudflare.com/v1alpha1/zones" {
                    let status = serde_json::json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "metadata": {},
                        "status": "Failure",
                        "message": "the server could not find the requested resource",
                        "reason": "NotFound",
                        "code": 404
                    });
                    let body = serde_json::to_vec(&status).unwrap();
                    send.send_response(Response::builder().status(404).body(Body::from(body)).unwrap());
                    rejected_tx.send(()).unwrap();
                } else {
                    pending.push(send);
                }
            }
        });

        let running = tokio::time::timeout(
            Duration::from_millis(500),
            run(State::default(), client, OperatorConfig::default()),
        )
        .await;
        assert!(running.is_err(), "controllers stopped with the zone controller");
        assert!(rejected_rx.try_recv().is_ok(), "zone CRD was queried");
    }
}
