use super::output::{print_latest_html, stream_reply};
use anyhow::Result;
use bidichat_core::{BidiChatConfig, Conversation, MessageRenderer, StreamOutcome};
use console::style;
use std::io::{self, Write};

/// Interactive chat loop over stdin
pub async fn handle_chat_command(config: &BidiChatConfig, html: bool) -> Result<()> {
    println!("{}", style("bidichat").blue().bold());
    println!("Endpoint: {}", config.stream.endpoint);
    println!("Locale: {}", config.render.locale);
    println!("{}", style("Type 'exit' to quit, Ctrl-C cancels a reply\n").dim());

    let conversation = Conversation::from_config(config)?;
    let renderer = MessageRenderer::from_config(config);

    loop {
        print!("{} ", style(">").cyan().bold());
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("{} {err}", style("Failed to read input:").red());
                break;
            }
        }

        let query = input.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }

        let outcome = stream_reply(&conversation, query, true).await?;
        if html && matches!(outcome, StreamOutcome::Completed { .. }) {
            print_latest_html(&conversation, &renderer);
        }
    }

    tracing::debug!(messages = conversation.messages().len(), "chat session ended");
    Ok(())
}
