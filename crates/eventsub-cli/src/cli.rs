use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eventsub")]
#[command(about = "Plan and apply Event Grid event subscriptions from flat manifests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to ./eventsub.toml when present)
    #[arg(long, global = true, env = "EVENTSUB_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// State file holding known resources and the simulated remote service
    #[arg(long, global = true, env = "EVENTSUB_STATE", default_value = ".eventsub-state.json")]
    pub state: PathBuf,

    /// Log level (overrides settings; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a manifest without contacting the service
    Validate(ManifestArgs),
    /// Print the payload a manifest would be written as
    Plan(ManifestArgs),
    /// Convert a remote JSON payload into a flat TOML manifest
    Flatten(FlattenArgs),
    /// Create or update the subscription described by a manifest
    Apply(ManifestArgs),
    /// Read the current state of a managed subscription
    Read(ManifestArgs),
    /// Delete a managed subscription
    Delete(ManifestArgs),
}

#[derive(clap::Args)]
pub struct ManifestArgs {
    /// Path to the TOML manifest
    pub manifest: PathBuf,
}

#[derive(clap::Args)]
pub struct FlattenArgs {
    /// Path to the JSON payload as returned by the service
    pub payload: PathBuf,
    /// Resource ID (defaults to the payload's `id`)
    #[arg(long)]
    pub id: Option<String>,
    /// Full webhook URL, if known
    #[arg(long)]
    pub full_url: Option<String>,
}
