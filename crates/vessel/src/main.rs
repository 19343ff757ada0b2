//! vessel - sync a local environment with a remote host
//!
//! Checks environment configs and prepares the ~/.vessel directory tree
//! before a sync or forwarding session starts.
//!
//! Commands:
//! - check: Validate an environment config
//! - init: Validate a config and create the directories a session needs
//! - paths: Show where Vessel keeps its state

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vessel_core::{EnvironmentConfig, Paths, Storage};

#[derive(Parser)]
#[command(name = "vessel")]
#[command(about = "Sync a local environment with a remote host over SSH forwarding")]
#[command(version)]
#[command(after_help = r#"WORKFLOW:
    1. vessel check vessel.yaml                 # Is the config complete?
    2. vessel init myapp --config vessel.yaml   # Prepare ~/.vessel for myapp
    3. vessel paths myapp                       # Where does state live?

CONFIG FORMAT:
    remote:
      hostname: example.com
      user: deploy
      identityfile: ~/.ssh/id_ed25519
      port: 22
      path: /srv/app
      alias: staging          # optional
    forwarding:
      - "8080:localhost:80"

LOGGING:
    Set RUST_LOG=vessel_core=debug to trace directory checks.
"#)]
struct Cli {
    /// Use this directory instead of the current user's home
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an environment config (alias: c)
    #[command(alias = "c")]
    Check {
        /// Path to the environment config
        config: PathBuf,
    },

    /// Validate a config and create the app and bin directories (alias: i)
    #[command(alias = "i")]
    Init {
        /// App name, used as the per-app directory name
        app: String,

        /// Path to the environment config
        #[arg(long, short)]
        config: PathBuf,
    },

    /// Show resolved paths without creating anything (alias: p)
    #[command(alias = "p")]
    Paths {
        /// Include per-app paths for this app
        app: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let home = cli.home;

    match cli.command {
        Commands::Check { config } => cmd_check(&config),
        Commands::Init { app, config } => cmd_init(home, &app, &config),
        Commands::Paths { app, json } => cmd_paths(&resolve_paths(home)?, app.as_deref(), json),
    }
}

fn resolve_paths(home: Option<PathBuf>) -> Result<Paths> {
    let paths = match home {
        Some(home) => Paths::from_home(home),
        None => Paths::discover()?,
    };
    debug!(home = %paths.home().display(), "resolved home directory");
    Ok(paths)
}

fn load_config(path: &Path) -> Result<EnvironmentConfig> {
    let config = EnvironmentConfig::load_validated(path)?;
    debug!(
        remote = %config.remote.display_address(),
        forwarding = config.forwarding.len(),
        "loaded environment config"
    );
    Ok(config)
}

/// Validate an environment config
fn cmd_check(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    println!(
        "ok: {} ({}), {} forwarding rule(s)",
        config.remote.display_name(),
        config.remote.display_address(),
        config.forwarding.len()
    );

    Ok(())
}

/// Validate a config and prepare the session directories
fn cmd_init(home: Option<PathBuf>, app: &str, path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let storage = match home {
        Some(home) => Storage::new(Paths::from_home(home)),
        None => Storage::discover()?,
    };
    debug!(home = %storage.paths().home().display(), "resolved home directory");

    let dirs = storage
        .ensure_session(app)
        .with_context(|| format!("Failed to prepare directories for {}", app))?;

    println!(
        "success: Ready to sync {} with {}",
        app,
        config.remote.display_name()
    );
    println!();
    println!("  App dir: {}", dirs.app_dir.display());
    println!("  Bin dir: {}", dirs.bin_dir.display());

    Ok(())
}

#[derive(Serialize)]
struct PathsReport {
    home: PathBuf,
    root: PathBuf,
    envs_root: PathBuf,
    bin_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_env_dir: Option<PathBuf>,
}

/// Show resolved paths
fn cmd_paths(paths: &Paths, app: Option<&str>, json: bool) -> Result<()> {
    let (app_dir, app_env_dir) = match app {
        Some(name) => (Some(paths.app_dir(name)?), Some(paths.app_env_dir(name)?)),
        None => (None, None),
    };

    let report = PathsReport {
        home: paths.home().to_path_buf(),
        root: paths.root(),
        envs_root: paths.envs_root(),
        bin_dir: paths.bin_dir(),
        app_dir,
        app_env_dir,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Vessel Paths");
    println!();
    println!("  Home:      {}", report.home.display());
    println!("  Root:      {}", report.root.display());
    println!("  Envs:      {}", report.envs_root.display());
    println!("  Bin:       {}", report.bin_dir.display());
    if let Some(ref dir) = report.app_dir {
        println!("  App:       {}", dir.display());
    }
    if let Some(ref dir) = report.app_env_dir {
        println!("  App env:   {}", dir.display());
    }

    Ok(())
}
