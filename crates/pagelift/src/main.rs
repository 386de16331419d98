//! Pagelift CLI - static-site generation from HTML note exports.
//!
//! Reads a hierarchical HTML export and writes a documentation site:
//! rewritten links, resolved pen embeds, injected assets, and a
//! navigation manifest.

mod error;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pagelift_core::{Config, SiteGenerator};

use error::CliError;
use output::Output;

/// Pagelift - lift a note export into a documentation site.
#[derive(Parser)]
#[command(name = "pagelift", version, about)]
struct Cli {
    /// Export directory to read.
    input_dir: PathBuf,

    /// Site directory to write. Wiped and recreated on every run.
    output_dir: PathBuf,

    /// Path to configuration file (default: auto-discover pagelift.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Version tag; pages land in a subdirectory of this name.
    #[arg(long, env = "PAGELIFT_VERSION_TAG")]
    version_tag: Option<String>,

    /// Embed theme id appended to resolved pen frames.
    #[arg(long, env = "PAGELIFT_THEME")]
    theme: Option<String>,

    /// Embed request timeout in seconds.
    #[arg(long, env = "PAGELIFT_EMBED_TIMEOUT")]
    embed_timeout: Option<u64>,

    /// URL prefix for injected asset references.
    #[arg(long, env = "PAGELIFT_ASSETS_BASE")]
    assets_base: Option<String>,

    /// Export-relative path of the categories document.
    #[arg(long)]
    categories_file: Option<String>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let output = Output::new();

    if let Err(err) = run(cli, &output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli, output: &Output) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref(), &cli.input_dir)?;
    match &config.config_path {
        Some(path) => debug!("using configuration from {}", path.display()),
        None => debug!("no configuration file found, using defaults"),
    }

    // Command-line flags win over file settings.
    if let Some(tag) = cli.version_tag {
        config.version_tag = Some(tag);
    }
    if let Some(theme) = cli.theme {
        config.embed_resolved.theme = Some(theme);
    }
    if let Some(secs) = cli.embed_timeout {
        config.embed_resolved.timeout = Duration::from_secs(secs);
    }
    if let Some(base) = cli.assets_base {
        config.assets_resolved.base_path = base;
    }
    if let Some(file) = cli.categories_file {
        config.categories_file = Some(file);
    }

    let summary = SiteGenerator::new(config).generate(&cli.input_dir, &cli.output_dir)?;

    output.success(&format!(
        "Wrote {} page(s) to {}",
        summary.pages,
        cli.output_dir.display()
    ));
    if summary.embeds_resolved > 0 {
        output.info(&format!("Resolved {} embed(s)", summary.embeds_resolved));
    }
    if summary.embeds_failed > 0 {
        output.warning(&format!(
            "{} embed(s) left unresolved after retries",
            summary.embeds_failed
        ));
    }
    if summary.categories > 0 {
        output.info(&format!("Extracted {} category link(s)", summary.categories));
    }
    Ok(())
}
