//! Freeze CLI - freeze command

use anyhow::{Context, Result};
use clap::Parser;
use cli_lib::report::{self, Palette};
use cli_lib::settings::{self, Overrides};
use freeze_core::{SnapshotFormat, SystemClock};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Freeze - snapshot a directory and report what changed since last time
#[derive(Parser)]
#[command(name = "freeze")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to snapshot
    root: PathBuf,

    /// Snapshot directory name under ROOT (default: .freeze)
    #[arg(long, value_name = "NAME")]
    snapshot_dir: Option<String>,

    /// Encoding for the new snapshot
    #[arg(long, value_name = "binary|lines")]
    format: Option<SnapshotFormat>,

    /// Treat a missing ROOT as an empty directory
    #[arg(long)]
    allow_missing_root: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    follow_links: bool,

    /// Report changes without writing a snapshot
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Config file (default: <config dir>/freeze/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(settings::log_level(cli.verbose, cli.quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = settings::load_config(cli.config.as_deref())?;
    Overrides {
        snapshot_dir: cli.snapshot_dir,
        format: cli.format,
        allow_missing_root: cli.allow_missing_root,
        follow_links: cli.follow_links,
        dry_run: cli.dry_run,
    }
    .apply(&mut config);

    let report = freeze_core::run(&cli.root, &config, Box::new(SystemClock))
        .with_context(|| format!("Failed to snapshot {}", cli.root.display()))?;

    if cli.json {
        println!("{}", report::render_json(&report)?);
    } else {
        let color = !cli.no_color
            && std::env::var_os("NO_COLOR").is_none()
            && std::io::stdout().is_terminal();
        print!(
            "{}",
            report::render_text(&report, Palette::new(color), chrono::Utc::now())
        );
    }

    Ok(())
}
