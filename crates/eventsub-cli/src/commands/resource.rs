//! Commands that reconcile against the service held in the state file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use eventsub_client::InMemoryClient;
use eventsub_config::{Settings, load_manifest, to_toml};
use eventsub_reconcile::{OperationContext, Reconciler};

use crate::output::{print_success, print_warning};
use crate::state::StateFile;

pub fn build_reconciler(settings: &Settings, client: Arc<InMemoryClient>) -> Reconciler<InMemoryClient> {
    Reconciler::new(
        client,
        settings.resource_kind,
        settings.subscription_id.clone(),
    )
}

/// A context bounded by `timeout` and cancelled on Ctrl-C.
fn context(timeout: Duration) -> OperationContext {
    let ctx = OperationContext::with_timeout(timeout);
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    ctx
}

pub async fn apply(settings: &Settings, state_path: &Path, manifest: &Path) -> Result<()> {
    let config = load_manifest(manifest)?;
    let mut file = StateFile::load(state_path)?;
    let client = file.client();
    let reconciler = build_reconciler(settings, client.clone());

    let key = config
        .target_id(settings.resource_kind, &settings.subscription_id)?
        .to_string();
    let mut state = file.resource(&key);
    let timeout = if state.id.is_some() {
        settings.timeouts.update()
    } else {
        settings.timeouts.create()
    };

    let result = reconciler
        .create_or_update(&context(timeout), &config, &mut state)
        .await;
    // Persist whatever reached the service, even on failure.
    file.record(&key, &state, &client);
    file.save(state_path)?;
    let applied = result?;

    info!(id = %key, "Applied manifest");
    print_success(&format!("Applied {key}"));
    print!("{}", to_toml(&applied)?);
    Ok(())
}

pub async fn read(settings: &Settings, state_path: &Path, manifest: &Path) -> Result<()> {
    let config = load_manifest(manifest)?;
    let mut file = StateFile::load(state_path)?;
    let client = file.client();
    let reconciler = build_reconciler(settings, client.clone());

    let key = config
        .target_id(settings.resource_kind, &settings.subscription_id)?
        .to_string();
    let mut state = file.resource(&key);
    if state.id.is_none() {
        print_warning(&format!("{key} is not managed yet - run `eventsub apply` first"));
        return Ok(());
    }

    let current = reconciler
        .read(&context(settings.timeouts.read()), &mut state)
        .await?;
    file.record(&key, &state, &client);
    file.save(state_path)?;

    match current {
        Some(current) => print!("{}", to_toml(&current)?),
        None => print_warning(&format!("{key} no longer exists and was removed from state")),
    }
    Ok(())
}

pub async fn delete(settings: &Settings, state_path: &Path, manifest: &Path) -> Result<()> {
    let config = load_manifest(manifest)?;
    let mut file = StateFile::load(state_path)?;
    let client = file.client();
    let reconciler = build_reconciler(settings, client.clone());

    let key = config
        .target_id(settings.resource_kind, &settings.subscription_id)?
        .to_string();
    let mut state = file.resource(&key);
    if state.id.is_none() {
        print_warning(&format!("{key} is not managed - nothing to delete"));
        return Ok(());
    }

    let result = reconciler
        .delete(&context(settings.timeouts.delete()), &mut state)
        .await;
    file.record(&key, &state, &client);
    file.save(state_path)?;
    result?;

    print_success(&format!("Deleted {key}"));
    Ok(())
}
