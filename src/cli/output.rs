//! Streams transcript changes to the terminal.

use anyhow::Result;
use bidichat_core::{Conversation, MessageId, MessageRenderer, Role, StreamOutcome, TranscriptEvent};
use console::style;
use std::io::{self, Write};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Prints each assistant reply incrementally. In-flight content only ever
/// grows, so only the unseen suffix is written after each update.
#[derive(Default)]
pub struct ReplyPrinter {
    current: Option<MessageId>,
    printed: usize,
}

impl ReplyPrinter {
    fn on_event(&mut self, conversation: &Conversation, event: &TranscriptEvent) -> Result<()> {
        let mut stdout = io::stdout();

        match *event {
            TranscriptEvent::Added {
                role: Role::Assistant,
                id,
            }
            | TranscriptEvent::Updated { id, .. } => {
                let Some(message) = conversation.transcript().read().get(id).cloned() else {
                    return Ok(());
                };
                if message.is_complete() && self.current != Some(id) {
                    // Failure notice appended after the stream ended
                    self.finish_line()?;
                    writeln!(stdout, "{}", style(&message.content).red())?;
                    return Ok(());
                }
                if self.current != Some(id) {
                    self.current = Some(id);
                    self.printed = 0;
                }
                if let Some(delta) = message.content.get(self.printed..) {
                    write!(stdout, "{delta}")?;
                    stdout.flush()?;
                }
                self.printed = message.content.len();
            }
            TranscriptEvent::Completed { id } if self.current == Some(id) => {
                self.finish_line()?;
            }
            TranscriptEvent::Discarded { id } if self.current == Some(id) => {
                self.finish_line()?;
                writeln!(stdout, "{}", style("[cancelled]").dim())?;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_line(&mut self) -> Result<()> {
        if self.current.take().is_some() && self.printed > 0 {
            writeln!(io::stdout())?;
        }
        self.printed = 0;
        Ok(())
    }
}

/// Send `query`, optionally echo the reply while it streams, and wait for
/// the outcome. Ctrl-C cancels the stream.
pub async fn stream_reply(
    conversation: &Conversation,
    query: &str,
    echo: bool,
) -> Result<StreamOutcome> {
    let mut events = conversation.subscribe();
    let handle = conversation.send(query)?;
    let mut printer = ReplyPrinter::default();
    let outcome = handle.outcome();
    tokio::pin!(outcome);

    let outcome = loop {
        tokio::select! {
            outcome = &mut outcome => break outcome,
            event = events.recv() => match event {
                Ok(event) if echo => printer.on_event(conversation, &event)?,
                Ok(_) | Err(RecvError::Closed) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "transcript events lagged");
                }
            },
            _ = tokio::signal::ctrl_c() => conversation.cancel(),
        }
    };

    // Events published right before the task finished
    loop {
        match events.try_recv() {
            Ok(event) if echo => printer.on_event(conversation, &event)?,
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    printer.finish_line()?;

    if let StreamOutcome::Failed { error, .. } = &outcome {
        eprintln!("{} {error}", style("stream failed:").red().bold());
    }
    Ok(outcome)
}

/// Print the rendered HTML of every assistant message after the last user one.
pub fn print_latest_html(conversation: &Conversation, renderer: &MessageRenderer) {
    let messages = conversation.messages();
    let start = messages
        .iter()
        .rposition(|message| message.role == Role::User)
        .map_or(0, |index| index + 1);
    for message in &messages[start..] {
        println!("{}", renderer.render_message(message));
    }
}
