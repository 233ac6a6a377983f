//! bidichat CLI entry point

mod cli;

use anyhow::{Context, Result};
use bidichat_core::{BidiChatConfig, ConfigManager};
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let workspace = std::env::current_dir().context("cannot determine current dir")?;

    // init must work even when an existing config is broken
    if let Some(Commands::Init { force }) = args.command {
        return cli::handle_init_command(&workspace, force);
    }

    let config = load_config(&args, &workspace)?;
    init_tracing(&config);

    match args.command.unwrap_or(Commands::Chat { html: false }) {
        Commands::Chat { html } => cli::handle_chat_command(&config, html).await,
        Commands::Ask { prompt, html } => {
            cli::handle_ask_command(&config, &prompt.join(" "), html).await
        }
        Commands::Render { file } => cli::handle_render_command(&config, file.as_deref()),
        Commands::Normalize { file } => cli::handle_normalize_command(&config, file.as_deref()),
        Commands::Init { .. } => Ok(()),
    }
}

fn load_config(args: &Cli, workspace: &std::path::Path) -> Result<BidiChatConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::load_from_file(path)?,
        None => ConfigManager::load_from_workspace(workspace)?,
    };
    let mut config = manager.into_config();

    if let Some(endpoint) = &args.endpoint {
        config.stream.endpoint = endpoint.clone();
    }
    if let Some(locale) = &args.locale {
        config.render.locale = locale.clone();
    }
    config
        .validate()
        .context("Invalid command-line overrides")?;
    Ok(config)
}

/// `RUST_LOG` wins over `[logging] filter`. Logs go to stderr so replies on
/// stdout stay clean.
fn init_tracing(config: &BidiChatConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
