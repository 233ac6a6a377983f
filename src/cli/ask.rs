use super::output::{print_latest_html, stream_reply};
use anyhow::{Result, bail};
use bidichat_core::{BidiChatConfig, Conversation, MessageRenderer, StreamOutcome};
use console::style;

/// Handle the ask command - one query, reply streamed to stdout
pub async fn handle_ask_command(config: &BidiChatConfig, prompt: &str, html: bool) -> Result<()> {
    if prompt.trim().is_empty() {
        bail!("No prompt provided. Use: bidichat ask \"Your question here\"");
    }

    eprintln!(
        "{} {}",
        style("endpoint:").dim(),
        style(&config.stream.endpoint).dim()
    );

    let conversation = Conversation::from_config(config)?;
    let outcome = stream_reply(&conversation, prompt, !html).await?;

    if html {
        print_latest_html(&conversation, &MessageRenderer::from_config(config));
    }

    match outcome {
        StreamOutcome::Failed { error, .. } => Err(error.into()),
        _ => Ok(()),
    }
}
