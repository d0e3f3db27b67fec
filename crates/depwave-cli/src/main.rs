#![forbid(unsafe_code)]

mod output;

use anyhow::Context;
use clap::Parser;
use depwave_core::config::parse_glob_list;
use depwave_core::{DiscoveryOptions, Kustomize, Settings, TracingSink, discover, schedule};
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "depwave: orders Kubernetes manifests into Argo CD sync waves",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Application directory to scan (defaults to the working directory).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Descend into subdirectories (same as PARAM_DIRECTORY_RECURSE=true).
    #[arg(short, long)]
    recurse: bool,

    /// Glob of files to read. Repeatable; `{a,b}` lists are accepted.
    #[arg(long, value_name = "GLOB")]
    include: Vec<String>,

    /// Glob of files or directories to skip. Repeatable; `{a,b}` lists are accepted.
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Kustomize executable used for kustomization directories.
    #[arg(long, value_name = "PROGRAM")]
    kustomize: Option<PathBuf>,
}

impl Cli {
    /// Plugin parameters from the environment, with flags taking precedence.
    fn settings(&self) -> depwave_core::Result<Settings> {
        let mut settings = Settings::from_env()?;
        if self.recurse {
            settings.recurse = true;
        }
        if !self.include.is_empty() {
            settings.include_patterns = flatten_globs(&self.include);
        }
        if !self.exclude.is_empty() {
            settings.exclude_patterns = flatten_globs(&self.exclude);
        }
        if let Some(program) = &self.kustomize {
            settings.kustomize.clone_from(program);
        }
        Ok(settings)
    }
}

fn flatten_globs(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|value| parse_glob_list(Some(value.as_str())))
        .collect()
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEPWAVE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let format = env::var("DEPWAVE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // stdout is reserved for the manifest stream.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(io::stderr().is_terminal())
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

fn log_settings(settings: &Settings) {
    if !settings.exclude_patterns.is_empty() {
        info!("Excluding patterns: {:?}", settings.exclude_patterns);
    }
    if !settings.include_patterns.is_empty() {
        info!("Including patterns: {:?}", settings.include_patterns);
    }
    if settings.recurse {
        info!("Recursive search: Enabled");
    }
    debug!(kustomize = %settings.kustomize.display(), "builder program");
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = cli.settings().context("loading plugin parameters")?;
    log_settings(&settings);

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("resolving working directory")?,
    };

    let options = DiscoveryOptions::from_settings(&settings)?;
    let builder = Kustomize::new(settings.kustomize.clone());

    let documents = discover(&root, &options, &builder)
        .with_context(|| format!("collecting manifests under {}", root.display()))?;
    let scheduled = schedule(documents, &mut TracingSink)?;
    if let Some(max) = scheduled.max_wave() {
        debug!(resources = scheduled.waves.len(), max_wave = max, "scheduling finished");
    }

    let rendered = output::render_stream(&scheduled.documents);
    output::write_stream(&mut io::stdout().lock(), &rendered).context("writing manifests")?;
    Ok(())
}

/// Log the error code and hint of a failed run.
///
/// The error chain itself is printed once by `main`'s `Err` return.
fn report(err: &anyhow::Error) {
    if let Some(core) = err.downcast_ref::<depwave_core::Error>() {
        error!(code = %core.code(), "{}", core.code().message());
        if let Some(hint) = core.hint() {
            error!("hint: {hint}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let result = run(&cli);
    if let Err(err) = &result {
        report(err);
    }
    result
}
