use anyhow::{Context, Result};
use bidichat_core::BidiChatConfig;
use console::style;
use std::path::Path;

/// Handle the init command
pub fn handle_init_command(workspace: &Path, force: bool) -> Result<()> {
    println!("{}", style("Initialize bidichat configuration").blue().bold());
    println!("Workspace: {}", workspace.display());

    let created = BidiChatConfig::bootstrap(workspace, force)
        .with_context(|| "failed to initialize configuration files")?;

    if created.is_empty() {
        println!(
            "{}",
            style("bidichat.toml already exists; use --force to overwrite").yellow()
        );
    }
    for file in created {
        println!("{} {file}", style("Created").green());
    }
    Ok(())
}
