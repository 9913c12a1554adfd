//! # blueprint
//!
//! Renders JSON documents through declarative view definitions.
//!
//! ```text
//! blueprint render --view user.toml --input users.json --option locale=uk
//! blueprint inspect --view user.toml
//! ```

mod args;
mod commands;
mod definition;
mod join;
mod telemetry;
mod transform;
mod view;

use crate::args::{AppCommands, Cli};
use crate::telemetry::Telemetry;
use clap::Parser;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = Telemetry::init(&cli.logging)?;
    debug!(file_logging = telemetry.has_file_output(), "Telemetry initialized");

    match cli.command {
        AppCommands::Render(args) => commands::render(args).await,
        AppCommands::Inspect(args) => commands::inspect(&args),
    }
}
