mod cli;
mod commands;
mod observability;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = eventsub_config::load_settings(cli.settings.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.logging.level);
    observability::init_tracing_with_level(level);
    tracing::debug!(
        resource_kind = %settings.resource_kind,
        state = %cli.state.display(),
        "Loaded settings"
    );

    match &cli.command {
        Commands::Validate(args) => commands::manifest::validate(&settings, &args.manifest)?,
        Commands::Plan(args) => commands::manifest::plan(&settings, &args.manifest)?,
        Commands::Flatten(args) => commands::manifest::flatten(
            &args.payload,
            args.id.as_deref(),
            args.full_url.as_deref(),
        )?,
        Commands::Apply(args) => {
            commands::resource::apply(&settings, &cli.state, &args.manifest).await?
        }
        Commands::Read(args) => {
            commands::resource::read(&settings, &cli.state, &args.manifest).await?
        }
        Commands::Delete(args) => {
            commands::resource::delete(&settings, &cli.state, &args.manifest).await?
        }
    }

    Ok(())
}
