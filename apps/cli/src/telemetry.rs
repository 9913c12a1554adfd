//! Process-wide tracing setup.
//!
//! Console output goes to stderr so stdout carries only rendered JSON.
//! `RUST_LOG` overrides the default level.

use crate::args::LogArgs;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "blueprint";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 10;

/// Keeps the non-blocking file writer alive. Drop it only on shutdown.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Telemetry {
    guard: Option<WorkerGuard>,
}

impl Telemetry {
    /// Installs the global subscriber.
    ///
    /// # Errors
    /// Fails if the log directory cannot be created or a subscriber is already set.
    pub fn init(args: &LogArgs) -> anyhow::Result<Self> {
        let level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
        let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

        let mut layers = Vec::new();
        layers.push(layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed());

        let guard = if let Some(dir) = &args.log_dir {
            let (file_layer, guard) = file_layer(dir, args.json_logs)?;
            layers.push(file_layer);
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layers)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(Self { guard })
    }

    /// Whether file logging is active.
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log files");
        }
    }
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn file_layer<S>(dir: &Path, json: bool) -> anyhow::Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .context("Failed to create rolling log appender")?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = layer().with_writer(writer).with_ansi(false);
    let boxed = if json { file_layer.json().boxed() } else { file_layer.boxed() };

    Ok((boxed, guard))
}
