//! Command-line interface module
//!
//! Argument definitions plus one handler per subcommand.

pub mod args;
pub mod ask;
pub mod chat;
pub mod init;
pub mod normalize;
pub mod output;
pub mod render;

pub use args::{Cli, Commands};
pub use ask::handle_ask_command;
pub use chat::handle_chat_command;
pub use init::handle_init_command;
pub use normalize::handle_normalize_command;
pub use render::handle_render_command;

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::path::Path;

/// Read a whole file, or stdin when no path is given.
pub(crate) fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}
