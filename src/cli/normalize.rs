use super::read_input;
use anyhow::Result;
use bidichat_core::{BidiChatConfig, TextPipeline};
use console::style;
use std::path::Path;

/// Print the normalized text and its direction
pub fn handle_normalize_command(config: &BidiChatConfig, file: Option<&Path>) -> Result<()> {
    let source = read_input(file)?;
    let view = TextPipeline::from_config(&config.text).run(&source);
    eprintln!("{} {}", style("direction:").dim(), view.direction());
    println!("{}", view.text);
    Ok(())
}
