use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use prope::config::Config;
use prope::{DrawStrategy, PromptPermutator, ReseedPolicy};

#[derive(Parser)]
#[command(
    name = "prope",
    version,
    about = "Render prompt templates against unique random samples of category dictionaries"
)]
struct Cli {
    #[arg(long, help = "Config file (default: user config dir)")]
    config: Option<PathBuf>,

    #[arg(short, long = "dicts", help = "Dictionary JSON file or directory (repeatable)")]
    dicts: Vec<PathBuf>,

    #[arg(short, long = "templates", help = "Template .tpl file or directory (repeatable)")]
    templates: Vec<PathBuf>,

    #[arg(short = 'n', long, help = "Prompts per template")]
    count: Option<usize>,

    #[arg(long, help = "Only render this template (file name)")]
    template: Option<String>,

    #[arg(long, help = "Seed for a reproducible run")]
    seed: Option<u64>,

    #[arg(long, value_enum, help = "How unique combinations are drawn")]
    strategy: Option<DrawStrategy>,

    #[arg(long, value_enum, help = "Generator behaviour on reset")]
    reseed: Option<ReseedPolicy>,

    #[arg(long, default_value = "\n", help = "Printed between prompts")]
    separator: String,

    #[arg(long, help = "Also write logs to this file")]
    log_file: Option<PathBuf>,
}

/// Diagnostics go to stderr, and optionally to `log_file` as plain text.
/// The returned guard flushes the file writer when dropped.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to initialize tracing")?;
    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let mut config = Config::load(cli.config.as_deref())?;
    if !cli.dicts.is_empty() {
        config.dict_paths = cli.dicts;
    }
    if !cli.templates.is_empty() {
        config.template_paths = cli.templates;
    }
    if let Some(count) = cli.count {
        config.count = count;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    if let Some(reseed) = cli.reseed {
        config.reseed = reseed;
    }

    let permutator = PromptPermutator::from_paths(
        &config.template_paths,
        &config.dict_paths,
        config.sampler_options(),
    )?;
    info!(
        seed = permutator.sampler().seed(),
        capacity = permutator.sampler().capacity(),
        "generating prompts"
    );

    let prompts = match &cli.template {
        Some(name) => permutator.gen_n(config.count, name)?,
        None => permutator.foreach_template_gen(config.count)?,
    };

    let mut out = io::stdout().lock();
    for prompt in &prompts {
        write!(out, "{prompt}{}", cli.separator)?;
    }
    out.flush()?;
    Ok(())
}
