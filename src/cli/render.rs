use super::read_input;
use anyhow::Result;
use bidichat_core::{BidiChatConfig, MessageRenderer};
use std::path::Path;

/// Run the text pipeline and the safe renderer over a document
pub fn handle_render_command(config: &BidiChatConfig, file: Option<&Path>) -> Result<()> {
    let source = read_input(file)?;
    let renderer = MessageRenderer::from_config(config);
    println!("{}", renderer.render_text(&source));
    Ok(())
}
