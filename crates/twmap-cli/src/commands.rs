use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use twmap_core::{FilterSelection, JsonSink, PipelineConfig, Session, SourceReport};

use crate::cli::{ConfigArgs, OutputFormatArg, RenderArgs, SelectionArgs, SummarizeArgs};
use crate::summary::{TableSink, print_catalog, print_sources};

pub fn run_render(args: &RenderArgs) -> Result<()> {
    let session = load_session(&args.config.config)?;
    let selection = selection(&session, &args.selection)?;
    let stdout = io::stdout().lock();
    match args.format {
        OutputFormatArg::Table => session.render_into(&selection, &mut TableSink::new(stdout)),
        OutputFormatArg::Json => session.render_into(&selection, &mut JsonSink::pretty(stdout)),
    }
    .with_context(|| format!("render {selection}"))
}

pub fn run_options(args: &ConfigArgs) -> Result<()> {
    let session = load_session(&args.config)?;
    let dataset = session.dataset()?;
    print_sources(&dataset.sources);
    let default = dataset.catalog.default_selection();
    print_catalog(&dataset.catalog, default.as_ref());
    Ok(())
}

pub fn run_summarize(args: &SummarizeArgs) -> Result<()> {
    let session = load_session(&args.config.config)?;
    let base = selection(&session, &args.selection)?;
    let pivot = session
        .pivot(&base, args.dimension.into())
        .context("build pivot summary")?;
    pivot
        .write_json(&args.output)
        .with_context(|| format!("write {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        options = pivot.options.len(),
        regions = pivot.data.len(),
        "summary written"
    );
    println!(
        "Wrote {} ({} options, {} regions)",
        args.output.display(),
        pivot.options.len(),
        pivot.data.len()
    );
    Ok(())
}

/// Read the configuration and load it on a single-threaded runtime.
fn load_session(path: &Path) -> Result<Session> {
    let config = PipelineConfig::from_path(path)
        .with_context(|| format!("load configuration {}", path.display()))?;
    let sources = config.plans().len();
    let mut session = Session::new(config).context("create session")?;

    let progress = ProgressBar::new(sources as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} sources {msg}")
            .context("progress template")?
            .progress_chars("=>-"),
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start runtime")?;
    let loaded = runtime.block_on(session.load_with_progress(&|report: &SourceReport| {
        progress.set_message(report.name.clone());
        progress.inc(1);
    }));
    progress.finish_and_clear();
    loaded.with_context(|| format!("load {}", path.display()))?;
    Ok(session)
}

/// Default selection with the command-line overrides applied.
fn selection(session: &Session, args: &SelectionArgs) -> Result<FilterSelection> {
    let base = session.default_selection()?.unwrap_or_default();
    Ok(args.apply(base))
}
