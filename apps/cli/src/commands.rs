use crate::args::{InspectArgs, RenderArgs};
use crate::definition::LoadedView;
use crate::view::CompiledView;
use anyhow::Context;
use blueprinter::Record;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::info;

pub async fn render(args: RenderArgs) -> anyhow::Result<()> {
    let loaded = LoadedView::load(&args.view)?;
    let view = CompiledView::compile(&loaded);

    let input = read_input(args.input.as_deref()).await?;
    let options: Record = args.options.into_iter().collect();

    info!(view = %loaded.display_name(), is_async = view.is_async(), "Rendering");
    let rendered = view
        .render(&input, &options)
        .await
        .with_context(|| format!("Failed to render view {}", args.view.display()))?;

    write_json(&rendered, args.pretty)
}

pub fn inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let loaded = LoadedView::load(&args.view)?;
    let summary = CompiledView::compile(&loaded).summary(loaded.display_name());
    write_json(&summary, true)
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<Value> {
    let raw = match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input {}", path.display()))?,
        _ => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw).context("Failed to read input from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Input is not valid JSON")
}

fn write_json<V: Serialize>(value: &V, pretty: bool) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}
