//! Offline commands: nothing here touches the (simulated) service.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use eventsub_client::InMemoryClient;
use eventsub_config::{SchemaRegistry, Settings, load_manifest, to_toml};
use eventsub_core::EventSubscriptionId;
use eventsub_core::model::EventSubscription;
use eventsub_reconcile::flatten_subscription;

use super::resource::build_reconciler;
use crate::output::{print_json, print_success};

pub fn validate(settings: &Settings, manifest: &Path) -> Result<()> {
    let config = load_manifest(manifest)?;
    let registry = SchemaRegistry::for_kind(settings.resource_kind);
    config
        .validate(&registry)
        .with_context(|| format!("{} is not a valid {}", manifest.display(), settings.resource_kind))?;
    let id = config.target_id(settings.resource_kind, &settings.subscription_id)?;
    print_success(&format!("{} is valid ({id})", manifest.display()));
    Ok(())
}

pub fn plan(settings: &Settings, manifest: &Path) -> Result<()> {
    let config = load_manifest(manifest)?;
    let reconciler = build_reconciler(settings, Arc::new(InMemoryClient::new()));
    let plan = reconciler.plan(&config)?;
    print_json(&json!({
        "id": plan.id.to_string(),
        "body": EventSubscription::from_properties(plan.properties),
    }))
}

pub fn flatten(payload: &Path, id: Option<&str>, full_url: Option<&str>) -> Result<()> {
    let content = fs::read_to_string(payload)
        .with_context(|| format!("Failed to read {}", payload.display()))?;
    let subscription: EventSubscription = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an event subscription payload", payload.display()))?;

    let raw_id = id
        .map(str::to_string)
        .or_else(|| subscription.id.clone())
        .context("No resource ID: pass --id or include `id` in the payload")?;
    let id: EventSubscriptionId = raw_id.parse()?;
    let name = subscription.name.clone().unwrap_or_else(|| id.name.clone());
    let properties = subscription.properties.unwrap_or_default();

    let config = flatten_subscription(&id, &properties, &name, full_url);
    print!("{}", to_toml(&config)?);
    Ok(())
}
