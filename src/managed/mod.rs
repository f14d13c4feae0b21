//! Generic managed-resource plumbing shared by every Cloudflare kind.
//!
//! A kind implements [`ManagedResource`] to expose its parameters, status and
//! external name, and provides an [`ExternalClient`] that knows how to
//! observe, create, update and delete the remote object. The reconcile loop in
//! [`reconcile`] drives that contract for all kinds alike.

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use k8s_openapi::{NamespaceResourceScope, api::core::v1::SecretKeySelector};
use kube::Resource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Result, cf_client::CloudflareClient};

mod reconcile;
pub use reconcile::{error_policy, reconcile, run};

/// Annotation holding the identifier of the remote object
pub static EXTERNAL_NAME_ANNOTATION: &str = "cloudflare.com/external-name";

/// What happens to the remote object when the custom resource is deleted
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Orphan,
}

/// Status shared by every managed kind
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedStatus<O> {
    /// The remote object exists
    #[serde(default)]
    pub ready: bool,
    /// The last reconcile succeeded
    #[serde(default)]
    pub synced: bool,
    /// Error from the last failed reconcile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Last observed state of the remote object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<O>,
}

impl<O> Default for ManagedStatus<O> {
    fn default() -> Self {
        Self {
            ready: false,
            synced: false,
            message: None,
            at_provider: None,
        }
    }
}

/// Result of observing the remote object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// Unset parameters were filled in from the remote object
    pub resource_late_initialized: bool,
}

impl ExternalObservation {
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Observe/Create/Update/Delete against the remote API for one kind.
///
/// `observe` and `create` may mutate the resource: they record the external
/// name, the observation and late-initialized parameters, which the reconciler
/// persists afterwards.
#[async_trait]
pub trait ExternalClient<K: Send + Sync>: Send + Sync {
    async fn observe(&self, mg: &mut K) -> Result<ExternalObservation>;
    async fn create(&self, mg: &mut K) -> Result<()>;
    async fn update(&self, mg: &mut K) -> Result<()>;
    async fn delete(&self, mg: &K) -> Result<()>;
}

/// Capabilities the generic reconciler needs from a Cloudflare custom resource
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    type Parameters: Clone + Debug + PartialEq + Serialize + Send + Sync;
    type Observation: Clone + Debug + Serialize + Send + Sync;

    const FINALIZER: &'static str;

    fn for_provider(&self) -> &Self::Parameters;
    fn for_provider_mut(&mut self) -> &mut Self::Parameters;
    fn managed_status(&self) -> Option<&ManagedStatus<Self::Observation>>;
    fn managed_status_mut(&mut self) -> &mut Option<ManagedStatus<Self::Observation>>;
    fn deletion_policy(&self) -> DeletionPolicy;
    fn credentials_secret_ref(&self) -> Option<&SecretKeySelector>;

    /// Bind a Cloudflare client to this kind's external client
    fn connect(client: Arc<CloudflareClient>) -> Box<dyn ExternalClient<Self>>;

    fn external_name(&self) -> Option<&str> {
        self.meta()
            .annotations
            .as_ref()?
            .get(EXTERNAL_NAME_ANNOTATION)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    fn set_external_name(&mut self, name: &str) {
        self.meta_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name.to_string());
    }

    fn set_observation(&mut self, observation: Self::Observation) {
        self.managed_status_mut()
            .get_or_insert_with(ManagedStatus::default)
            .at_provider = Some(observation);
    }
}

/// Implement [`ManagedResource`] for a kind whose spec has the usual
/// `for_provider`, `deletion_policy` and `credentials_secret_ref` fields.
macro_rules! managed_resource {
    ($kind:ty, $params:ty, $obs:ty, $finalizer:literal, $external:ty) => {
        impl $crate::managed::ManagedResource for $kind {
            type Parameters = $params;
            type Observation = $obs;

            const FINALIZER: &'static str = $finalizer;

            fn for_provider(&self) -> &$params {
                &self.spec.for_provider
            }

            fn for_provider_mut(&mut self) -> &mut $params {
                &mut self.spec.for_provider
            }

            fn managed_status(&self) -> Option<&$crate::managed::ManagedStatus<$obs>> {
                self.status.as_ref()
            }

            fn managed_status_mut(&mut self) -> &mut Option<$crate::managed::ManagedStatus<$obs>> {
                &mut self.status
            }

            fn deletion_policy(&self) -> $crate::managed::DeletionPolicy {
                self.spec.deletion_policy
            }

            fn credentials_secret_ref(&self) -> Option<&k8s_openapi::api::core::v1::SecretKeySelector> {
                self.spec.credentials_secret_ref.as_ref()
            }

            fn connect(
                client: std::sync::Arc<$crate::cf_client::CloudflareClient>,
            ) -> Box<dyn $crate::managed::ExternalClient<Self>> {
                Box::new(<$external>::new(client))
            }
        }
    };
}
pub(crate) use managed_resource;
