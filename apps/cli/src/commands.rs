//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use packetpress_core::{
    Capabilities, Orchestrator, ResolverOptions, RunConfig, SlotResolver, example_manifest,
    manifest::PacketManifest,
};
use packetpress_localfs::{ConcatMerger, LocalDownloader, LocalIndexProvider, TextGenerator};
use packetpress_shared::{
    AppConfig, ProgressUpdate, RunId, RunOptions, SlotStatus, config_file_path, init_config,
    load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PacketPress — assemble document packets from folder trees.
#[derive(Parser)]
#[command(
    name = "packetpress",
    version,
    about = "Resolve a slot manifest against a folder tree and merge the matches into one packet.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve a manifest and assemble the packet.
    Assemble {
        /// Path to the manifest JSON file.
        #[arg(long)]
        manifest: PathBuf,

        /// Source directory to index.
        #[arg(long)]
        source: PathBuf,

        /// Output file path (defaults to <output_dir>/<manifest name>.packet).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Accepted content extensions, comma-separated (overrides config).
        #[arg(long)]
        extensions: Option<String>,

        /// Keep the per-run working directory for inspection.
        #[arg(long)]
        keep_work_dir: bool,
    },

    /// Resolve a manifest against a source directory without assembling.
    Resolve {
        /// Path to the manifest JSON file.
        #[arg(long)]
        manifest: PathBuf,

        /// Source directory to index.
        #[arg(long)]
        source: PathBuf,

        /// Emit the resolution as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Validate a manifest file without touching any source tree.
    Validate {
        /// Path to the manifest JSON file.
        manifest: PathBuf,
    },

    /// Print a sample manifest exercising every search strategy.
    Example,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "packetpress=info",
        1 => "packetpress=debug",
        _ => "packetpress=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Assemble {
            manifest,
            source,
            out,
            extensions,
            keep_work_dir,
        } => cmd_assemble(
            &manifest,
            &source,
            out.as_deref(),
            extensions.as_deref(),
            keep_work_dir,
        ),
        Command::Resolve {
            manifest,
            source,
            json,
        } => cmd_resolve(&manifest, &source, json),
        Command::Validate { manifest } => cmd_validate(&manifest),
        Command::Example => cmd_example(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Path => cmd_config_path(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_assemble(
    manifest_path: &Path,
    source: &Path,
    out: Option<&Path>,
    extensions: Option<&str>,
    keep_work_dir: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut options = RunOptions::from(&config);
    if let Some(exts) = extensions {
        options.extensions = parse_extensions(exts);
    }
    options.keep_work_dir |= keep_work_dir;

    let manifest = PacketManifest::from_json_file(manifest_path)?;

    let output_path = match out {
        Some(p) => p.to_path_buf(),
        None => expand_tilde(&options.output_dir)
            .join(format!("{}.packet", slugify(manifest.name()))),
    };

    let run_id = RunId::new();
    let work_dir = expand_tilde(&options.work_dir).join(run_id.to_string());

    info!(
        manifest = %manifest.name(),
        source = %source.display(),
        run_id = %run_id,
        "assembling packet"
    );

    let resolver = SlotResolver::new(ResolverOptions {
        extensions: options.extensions.clone(),
    });
    let progress = CliProgress::new();
    let orchestrator = Orchestrator::new(
        &manifest,
        resolver,
        Capabilities {
            index: &LocalIndexProvider,
            downloader: &LocalDownloader,
            merger: &ConcatMerger,
            progress: &progress,
            generator: &TextGenerator,
        },
    );

    let run_config = RunConfig {
        source_root: source.to_string_lossy().into_owned(),
        work_dir: work_dir.clone(),
        output_path,
    };
    let report = orchestrator.run(&run_config);
    progress.finish();

    if !options.keep_work_dir {
        if let Err(e) = std::fs::remove_dir_all(&work_dir) {
            tracing::debug!(error = %e, "work dir cleanup skipped");
        }
    }

    let report = report?;

    println!();
    if report.success {
        println!("  Packet assembled!");
        println!("  Manifest: {}", manifest.name());
        println!(
            "  Slots:    {}/{} completed",
            report.completed_slots, report.total_slots
        );
        if let Some(path) = &report.final_output_path {
            println!("  Output:   {}", path.display());
        }
        for result in &report.slot_results {
            for warning in &result.warnings {
                println!("  Warning:  [{}] {warning}", result.name);
            }
        }
        println!();
        Ok(())
    } else {
        println!("  Assembly failed.");
        if let Some(message) = &report.error_message {
            println!("  Reason:   {message}");
        }
        for item in report.missing_items() {
            println!("  Missing:  {item}");
        }
        println!();
        Err(eyre!("packet assembly failed"))
    }
}

fn cmd_resolve(manifest_path: &Path, source: &Path, json: bool) -> Result<()> {
    use packetpress_core::FileIndexProvider;

    let config = load_config()?;
    let options = RunOptions::from(&config);

    let manifest = PacketManifest::from_json_file(manifest_path)?;
    let index = LocalIndexProvider.list(&source.to_string_lossy())?;
    let resolver = SlotResolver::new(ResolverOptions {
        extensions: options.extensions,
    });
    let outcome = resolver.resolve_all(&manifest, &index);

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
        return Ok(());
    }

    println!();
    println!("  Manifest: {} ({} slots)", manifest.name(), outcome.results.len());
    println!();
    for result in &outcome.results {
        let marker = match result.status {
            SlotStatus::Satisfied => "ok     ",
            SlotStatus::Partial => "partial",
            SlotStatus::Missing => "MISSING",
        };
        println!("  [{marker}] #{:<3} {}", result.slot_id, result.name);
        for path in &result.matched_paths {
            println!("              {path}");
        }
        if let Some(message) = &result.error_message {
            println!("              ({message})");
        }
    }
    println!();
    if !outcome.required_coverage_met() {
        println!(
            "  Required slots missing: {}",
            outcome.missing_required.join(", ")
        );
        println!();
        return Err(eyre!("required slots unresolved"));
    }
    Ok(())
}

fn cmd_validate(manifest_path: &Path) -> Result<()> {
    let manifest = PacketManifest::from_json_file(manifest_path)?;
    println!(
        "Manifest '{}' (v{}) is valid: {} slots.",
        manifest.name(),
        manifest.version(),
        manifest.slots().len()
    );
    Ok(())
}

fn cmd_example() -> Result<()> {
    let manifest = example_manifest();
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_path() -> Result<()> {
    println!("{}", config_file_path()?.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress sink
// ---------------------------------------------------------------------------

/// Progress sink rendering pipeline checkpoints as an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/dim} {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl packetpress_core::ProgressSink for CliProgress {
    fn report(&self, update: &ProgressUpdate) -> packetpress_shared::Result<()> {
        match update {
            ProgressUpdate::Checkpoint { percent, message } => {
                self.bar.set_position(u64::from(*percent));
                self.bar.set_message(message.clone());
            }
            ProgressUpdate::Failed { message } => {
                self.bar.abandon_with_message(format!("failed: {message}"));
            }
        }
        Ok(())
    }

    fn report_output(&self, locator: &str) -> packetpress_shared::Result<()> {
        self.bar.set_message(locator.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Expand a leading `~/` against the home directory, if one is known.
fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
