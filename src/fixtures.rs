//! Helper methods only available for tests
use crate::{
    Context, OperatorConfig, Result,
    cloudflare::{CloudflareClientProvider, Config},
    dns_record::{DNSRecord, DNSRecordSpec, RecordParameters, RecordStatus, RecordType},
    managed::{EXTERNAL_NAME_ANNOTATION, ManagedResource},
};
use assert_json_diff::assert_json_include;
use http::{Request, Response};
use kube::{Client, Resource, ResourceExt, client::Body, runtime::events::Recorder};
use std::sync::Arc;

impl DNSRecord {
    /// A normal test record, `www` in zone `zone-id`
    pub fn test() -> Self {
        let mut d = DNSRecord::new("test", DNSRecordSpec {
            for_provider: RecordParameters {
                record_type: Some(RecordType::A),
                name: "www".into(),
                content: "192.0.2.1".into(),
                ttl: Some(1),
                proxied: Some(false),
                priority: None,
                zone: Some("zone-id".into()),
            },
            ..Default::default()
        });
        d.meta_mut().namespace = Some("default".into());
        d
    }

    /// Modify record to be set to deleted
    pub fn needs_delete(mut self) -> Self {
        use chrono::prelude::{DateTime, TimeZone, Utc};
        let now: DateTime<Utc> = Utc.with_ymd_and_hms(2017, 4, 2, 12, 50, 32).unwrap();
        use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
        self.meta_mut().deletion_timestamp = Some(Time(now));
        self
    }

    /// Modify a record to have the expected finalizer
    pub fn finalized(mut self) -> Self {
        self.finalizers_mut().push(Self::FINALIZER.to_string());
        self
    }

    /// Modify a record to point at an existing Cloudflare record
    pub fn with_external_name(mut self, id: &str) -> Self {
        self.set_external_name(id);
        self
    }

    /// Modify a record to have an expected status
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }
}

// We wrap tower_test::mock::Handle
type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;
pub struct ApiServerVerifier(ApiServerHandle);

/// Scenarios we test for in ApiServerVerifier
pub enum Scenario {
    /// objects without finalizers will get a finalizer applied (and not call the apply loop)
    FinalizerCreation(DNSRecord),
    /// a created record gets its external name persisted, then a status patch
    Create(DNSRecord, String),
    /// an in-sync record only causes a status patch
    StatusPatch(DNSRecord),
    /// a failed apply is recorded on the status before the error is returned
    FailedStatusPatch(DNSRecord),
    /// objects with a deletion timestamp will run the cleanup loop sending event and removing the finalizer
    Cleanup(String, DNSRecord),
}

pub async fn timeout_after_1s(handle: tokio::task::JoinHandle<()>) {
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("timeout on mock apiserver")
        .expect("scenario succeeded")
}

fn resource_path(doc: &DNSRecord) -> String {
    format!("/apis/cloudflare.com/v1alpha1/namespaces/default/dnsrecords/{}", doc.name_any())
}

impl ApiServerVerifier {
    /// Tests only get to run specific scenarios that has matching handlers
    ///
    /// This setup makes it easy to handle multiple requests by chaining handlers together.
    ///
    /// NB: If the controller is making more calls than we are handling in the scenario,
    /// you then typically see a `KubeError(Service(Closed(())))` from the reconciler.
    ///
    /// You should await the `JoinHandle` (with a timeout) from this function to ensure that the
    /// scenario runs to completion (i.e. all expected calls were responded to),
    /// using the timeout to catch missing api calls to Kubernetes.
    pub fn run(self, scenario: Scenario) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            // moving self => one scenario per test
            match scenario {
                Scenario::FinalizerCreation(doc) => self.handle_finalizer_creation(doc).await,
                Scenario::Create(doc, id) => {
                    let expected = doc.clone().with_external_name(&id);
                    self.handle_external_name_patch(doc, &id)
                        .await
                        .unwrap()
                        .handle_status_patch(expected, false, true)
                        .await
                }
                Scenario::StatusPatch(doc) => self.handle_status_patch(doc, true, true).await,
                Scenario::FailedStatusPatch(doc) => self.handle_status_patch(doc, false, false).await,
                Scenario::Cleanup(reason, doc) => {
                    self.handle_event_create(reason)
                        .await
                        .unwrap()
                        .handle_finalizer_removal(doc)
                        .await
                }
            }
            .expect("scenario completed without errors");
        })
    }

    // chainable scenario handlers

    async fn handle_finalizer_creation(mut self, doc: DNSRecord) -> Result<Self> {
        let (request, send) = self.0.next_request().await.expect("service not called");
        // We expect a json patch to the specified record adding our finalizer
        assert_eq!(request.method(), http::Method::PATCH);
        assert_eq!(request.uri().to_string(), format!("{}?", resource_path(&doc)));
        let expected_patch = serde_json::json!([
            { "op": "test", "path": "/metadata/finalizers", "value": null },
            { "op": "add", "path": "/metadata/finalizers", "value": vec![DNSRecord::FINALIZER] }
        ]);
        let req_body = request.into_body().collect_bytes().await.unwrap();
        let runtime_patch: serde_json::Value =
            serde_json::from_slice(&req_body).expect("valid record from runtime");
        assert_json_include!(actual: runtime_patch, expected: expected_patch);

        let response = serde_json::to_vec(&doc.finalized()).unwrap(); // respond as the apiserver would have
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        Ok(self)
    }

    async fn handle_finalizer_removal(mut self, doc: DNSRecord) -> Result<Self> {
        let (request, send) = self.0.next_request().await.expect("service not called");
        // We expect a json patch to the specified record removing our finalizer (at index 0)
        assert_eq!(request.method(), http::Method::PATCH);
        assert_eq!(request.uri().to_string(), format!("{}?", resource_path(&doc)));
        let expected_patch = serde_json::json!([
            { "op": "test", "path": "/metadata/finalizers/0", "value": DNSRecord::FINALIZER },
            { "op": "remove", "path": "/metadata/finalizers/0" }
        ]);
        let req_body = request.into_body().collect_bytes().await.unwrap();
        let runtime_patch: serde_json::Value =
            serde_json::from_slice(&req_body).expect("valid record from runtime");
        assert_json_include!(actual: runtime_patch, expected: expected_patch);

        let response = serde_json::to_vec(&doc).unwrap(); // respond as the apiserver would have
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        Ok(self)
    }

    async fn handle_event_create(mut self, reason: String) -> Result<Self> {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(
            request.uri().to_string(),
            "/apis/events.k8s.io/v1/namespaces/default/events?"
        );
        // verify the event reason matches the expected
        let req_body = request.into_body().collect_bytes().await.unwrap();
        let postdata: serde_json::Value =
            serde_json::from_slice(&req_body).expect("valid event from runtime");
        dbg!("postdata for event: {}", postdata.clone());
        assert_eq!(
            serde_json::json!(reason),
            *postdata.get("reason").expect("event has a reason")
        );
        // then pass through the body
        send.send_response(Response::builder().body(Body::from(req_body)).unwrap());
        Ok(self)
    }

    async fn handle_external_name_patch(mut self, doc: DNSRecord, id: &str) -> Result<Self> {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), http::Method::PATCH);
        assert_eq!(request.uri().path(), resource_path(&doc));
        let req_body = request.into_body().collect_bytes().await.unwrap();
        let patch: serde_json::Value = serde_json::from_slice(&req_body).expect("merge patch is json");
        let expected = serde_json::json!({
            "metadata": { "annotations": { EXTERNAL_NAME_ANNOTATION: id } }
        });
        assert_json_include!(actual: patch, expected: expected);

        let response = serde_json::to_vec(&doc.with_external_name(id)).unwrap();
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        Ok(self)
    }

    async fn handle_status_patch(mut self, doc: DNSRecord, ready: bool, synced: bool) -> Result<Self> {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), http::Method::PATCH);
        assert_eq!(
            request.uri().to_string(),
            format!(
                "{}/status?&force=true&fieldManager=cloudflare-provider",
                resource_path(&doc)
            )
        );
        let req_body = request.into_body().collect_bytes().await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&req_body).expect("patch_status object is json");
        let status_json = json.get("status").expect("status object").clone();
        let status: RecordStatus = serde_json::from_value(status_json).expect("valid status");
        assert_eq!(status.ready, ready, "status.ready");
        assert_eq!(status.synced, synced, "status.synced");
        if !synced {
            assert!(status.message.is_some(), "failures carry a message");
        }
        if ready {
            let observed = status.at_provider.as_ref().expect("observation recorded");
            assert_eq!(observed.fqdn, "www.example.com");
        }

        let response = serde_json::to_vec(&doc.with_status(status)).unwrap();
        // pass through record "patch accepted"
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        Ok(self)
    }
}

impl Context {
    // Create a test context with a mocked kube client, talking to Cloudflare at `api_url`
    pub fn test(api_url: &str) -> (Arc<Self>, ApiServerVerifier) {
        let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let mock_client = Client::new(mock_service, "default");
        let mock_recorder = Recorder::new(mock_client.clone(), "cloudflare-provider-test".into());
        let config = OperatorConfig {
            credentials: Some(Config::ApiToken {
                token: "test-token".into(),
            }),
            api_url: api_url.to_string(),
            ..Default::default()
        };
        let ctx = Self {
            client: mock_client.clone(),
            metrics: Arc::default(),
            diagnostics: Arc::default(),
            recorder: mock_recorder,
            provider: CloudflareClientProvider::new(mock_client, config.credentials.clone(), api_url),
            config,
        };
        (Arc::new(ctx), ApiServerVerifier(handle))
    }
}
