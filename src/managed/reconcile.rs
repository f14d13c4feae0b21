use crate::{
    Context, Error, Result,
    managed::{DeletionPolicy, EXTERNAL_NAME_ANNOTATION, ManagedResource, ManagedStatus},
    telemetry,
};
use chrono::Utc;
use futures::StreamExt;
use kube::{
    Resource,
    api::{Api, ListParams, Patch, PatchParams, ResourceExt},
    runtime::{
        controller::{self, Action, Controller},
        events::{Event, EventType},
        finalizer::{Event as Finalizer, finalizer},
        watcher::Config,
    },
};
use serde_json::json;
use std::sync::Arc;
use tracing::*;

static FIELD_MANAGER: &str = "cloudflare-provider";

#[instrument(skip(ctx, mg), fields(trace_id))]
pub async fn reconcile<K: ManagedResource>(mg: Arc<K>, ctx: Arc<Context>) -> Result<Action> {
    let trace_id = telemetry::get_trace_id();
    if trace_id != opentelemetry::trace::TraceId::INVALID {
        Span::current().record("trace_id", field::display(&trace_id));
    }
    let kind = K::kind(&());
    let _timer = ctx.metrics.reconcile.count_and_measure(&kind);
    ctx.diagnostics.write().await.last_event = Utc::now();
    let ns = mg.namespace().ok_or(Error::MissingNamespace)?;
    let api: Api<K> = Api::namespaced(ctx.client.clone(), &ns);

    info!("Reconciling {} \"{}\" in {}", kind, mg.name_any(), ns);
    finalizer(&api, K::FINALIZER, mg, |event| async {
        match event {
            Finalizer::Apply(mg) => apply(mg, &api, &ns, &ctx).await,
            Finalizer::Cleanup(mg) => cleanup(mg, &ns, &ctx).await,
        }
    })
    .await
    .map_err(|e| Error::FinalizerError(Box::new(e)))
}

pub fn error_policy<K: ManagedResource>(mg: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action {
    warn!("reconcile failed: {:?}", error);
    ctx.metrics.reconcile.set_failure(&K::kind(&()), mg.as_ref(), error);
    Action::requeue(ctx.config.error_requeue)
}

// Reconcile (for non-finalizer related changes)
async fn apply<K: ManagedResource>(mg: Arc<K>, api: &Api<K>, ns: &str, ctx: &Context) -> Result<Action> {
    let mut mg = (*mg).clone();
    let result = sync(&mut mg, api, ns, ctx).await;

    // always overwrite status object with what we saw
    let previous = mg.managed_status().cloned().unwrap_or_default();
    let status = match &result {
        Ok(exists) => ManagedStatus {
            ready: *exists,
            synced: true,
            message: None,
            at_provider: previous.at_provider,
        },
        Err(e) => ManagedStatus {
            synced: false,
            message: Some(e.to_string()),
            ..previous
        },
    };
    match (result, patch_status(api, &mg, &status).await) {
        (Err(e), Err(status_err)) => {
            warn!("could not record failure on status: {status_err}");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(_), Err(status_err)) => Err(status_err),
        // If no events were received, check back after the poll interval
        (Ok(_), Ok(())) => Ok(Action::requeue(ctx.config.poll_interval)),
    }
}

/// Drive the external client once; returns whether the remote object was observed to exist.
async fn sync<K: ManagedResource>(mg: &mut K, api: &Api<K>, ns: &str, ctx: &Context) -> Result<bool> {
    let client = ctx.provider.get_client(mg.credentials_secret_ref(), ns).await?;
    let external = K::connect(client);

    let observation = external.observe(mg).await?;
    debug!(?observation, "observed external resource");

    if observation.resource_late_initialized {
        let patch = json!({ "spec": { "forProvider": mg.for_provider() } });
        api.patch(&mg.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(Error::KubeError)?;
    }

    if !observation.resource_exists {
        external.create(mg).await?;
        // the external name is the only link to the remote object, store it before anything else
        if let Some(name) = mg.external_name() {
            let patch = json!({ "metadata": { "annotations": { EXTERNAL_NAME_ANNOTATION: name } } });
            api.patch(&mg.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
                .await
                .map_err(Error::KubeError)?;
        }
        info!("Created {} \"{}\"", K::kind(&()), mg.name_any());
        return Ok(false);
    }

    if !observation.resource_up_to_date {
        external.update(mg).await?;
        info!("Updated {} \"{}\"", K::kind(&()), mg.name_any());
    }
    Ok(true)
}

async fn patch_status<K: ManagedResource>(
    api: &Api<K>,
    mg: &K,
    status: &ManagedStatus<K::Observation>,
) -> Result<()> {
    let patch = Patch::Apply(json!({
        "apiVersion": K::api_version(&()),
        "kind": K::kind(&()),
        "status": status,
    }));
    let ps = PatchParams::apply(FIELD_MANAGER).force();
    api.patch_status(&mg.name_any(), &ps, &patch)
        .await
        .map_err(Error::KubeError)?;
    Ok(())
}

// Finalizer cleanup (the object was deleted, ensure nothing is orphaned unless asked to)
async fn cleanup<K: ManagedResource>(mg: Arc<K>, ns: &str, ctx: &Context) -> Result<Action> {
    let oref = mg.object_ref(&());
    let orphan = mg.deletion_policy() == DeletionPolicy::Orphan;

    if !orphan && mg.external_name().is_some() {
        let mut mg = (*mg).clone();
        let client = ctx.provider.get_client(mg.credentials_secret_ref(), ns).await?;
        let external = K::connect(client);
        if external.observe(&mut mg).await?.resource_exists {
            external.delete(&mg).await?;
            info!("Deleted {} \"{}\"", K::kind(&()), mg.name_any());
        }
    }

    let note = if orphan {
        format!("Delete `{}`, orphaning the Cloudflare object", mg.name_any())
    } else {
        format!("Delete `{}`", mg.name_any())
    };
    ctx.recorder
        .publish(
            &Event {
                type_: EventType::Normal,
                reason: "DeleteRequested".into(),
                note: Some(note),
                action: "Deleting".into(),
                secondary: None,
            },
            &oref,
        )
        .await
        .map_err(Error::KubeError)?;
    Ok(Action::await_change())
}

/// Initialize the controller for one kind (given the crd is installed)
pub async fn run<K: ManagedResource>(ctx: Arc<Context>) {
    let kind = K::kind(&());
    let docs = Api::<K>::all(ctx.client.clone());
    if let Err(e) = docs.list(&ListParams::default().limit(1)).await {
        error!("CRD for {kind} is not queryable; {e:?}. Is the CRD installed?");
        info!("Installation: cargo run --bin crdgen | kubectl apply -f -");
        return;
    }

    let config = controller::Config::default().concurrency(ctx.config.max_concurrent_reconciles);
    Controller::new(docs, Config::default().any_semantic())
        .with_config(config)
        .shutdown_on_signal()
        .run(reconcile::<K>, error_policy::<K>, ctx)
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;
}
