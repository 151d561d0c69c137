//! piknik: copy/paste anything over the network
//!
//! Commands:
//!   copy         - read stdin and store it on the server
//!   paste        - print the stored clipboard to stdout
//!   move         - print the stored clipboard and delete it on the server
//!   keygen       - print a fresh configuration with new keys
//!   config show  - display the resolved configuration, secrets redacted

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use piknik_client::{ClientConfig, ClipboardClient};
use piknik_core::config::PiknikConfig;
use piknik_core::FetchMode;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "piknik",
    version,
    about = "Copy/paste anything over the network",
    long_about = "piknik: authenticated, end-to-end encrypted clipboard shared between hosts"
)]
struct Cli {
    /// Path to the piknik configuration file
    #[arg(long, short = 'c', env = "PIKNIK_CONFIG", default_value = "~/.piknik.toml")]
    config: PathBuf,

    /// Server address (host:port), overrides the config file
    #[arg(long, env = "PIKNIK_CONNECT")]
    connect: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PIKNIK_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "PIKNIK_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store standard input as the shared clipboard
    Copy,

    /// Write the shared clipboard to standard output
    Paste,

    /// Write the shared clipboard to standard output and delete it
    Move,

    /// Generate new keys and print a matching configuration
    Keygen,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (defaults + config file), secrets redacted
    Show,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config_path = expand_tilde(&cli.config);
    let mut config = load_config(&config_path)?;
    if let Some(connect) = cli.connect {
        config.connect = connect;
    }
    debug!(config = %config_path.display(), connect = %config.connect, "piknik starting");

    match cli.command {
        Commands::Copy => cmd_copy(&config).await,
        Commands::Paste => cmd_fetch(&config, FetchMode::Get).await,
        Commands::Move => cmd_fetch(&config, FetchMode::Move).await,
        Commands::Keygen => cmd_keygen(&config),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

// ── Logging and config ────────────────────────────────────────────────────────

/// Log to stderr; stdout carries clipboard data.
fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: &Path) -> Result<PiknikConfig> {
    if path.exists() {
        PiknikConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
    } else {
        debug!("config file not found: {}  (using defaults)", path.display());
        Ok(PiknikConfig::default())
    }
}

/// Expand `~` in path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    match s.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    }
}

fn build_client(config: &PiknikConfig) -> Result<ClipboardClient> {
    let resolved = ClientConfig::from_config(config).context(
        "incomplete configuration\n\
         Run `piknik keygen` and save its output to ~/.piknik.toml on every host.",
    )?;
    Ok(ClipboardClient::new(resolved))
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .context("building spinner style")?,
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

// ── `piknik copy` ─────────────────────────────────────────────────────────────

async fn cmd_copy(config: &PiknikConfig) -> Result<()> {
    let client = build_client(config)?;

    let mut data = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut data)
        .await
        .context("reading standard input")?;

    let pb = make_spinner("copy")?;
    pb.set_message("sending…");
    let result = client
        .store(&data)
        .await
        .with_context(|| format!("storing clipboard on {}", config.connect));
    match result {
        Ok(()) => {
            pb.finish_with_message(format!("sent {} bytes", data.len()));
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            Err(e)
        }
    }
}

// ── `piknik paste` / `piknik move` ────────────────────────────────────────────

async fn cmd_fetch(config: &PiknikConfig, mode: FetchMode) -> Result<()> {
    let client = build_client(config)?;

    let pb = make_spinner(if mode.is_move() { "move" } else { "paste" })?;
    pb.set_message("receiving…");
    let data = match client
        .fetch(mode)
        .await
        .with_context(|| format!("fetching clipboard from {}", config.connect))
    {
        Ok(data) => data,
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e);
        }
    };
    pb.finish_with_message(format!("received {} bytes", data.len()));

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(&data)
        .await
        .context("writing standard output")?;
    stdout.flush().await.context("flushing standard output")?;
    Ok(())
}

// ── `piknik keygen` ───────────────────────────────────────────────────────────

/// A complete config with fresh keys, pointing at `connect`.
fn keygen_config(connect: &str) -> PiknikConfig {
    let keys = piknik_crypto::generate_keys();
    PiknikConfig {
        connect: connect.to_string(),
        psk: Some(hex::encode(keys.psk.as_bytes())),
        sign_pk: Some(hex::encode(keys.verifying_key().as_bytes())),
        sign_sk: Some(hex::encode(keys.signing_key.to_bytes())),
        encrypt_sk: Some(hex::encode(keys.encrypt_key.as_bytes())),
        ..PiknikConfig::default()
    }
}

fn cmd_keygen(config: &PiknikConfig) -> Result<()> {
    let generated = keygen_config(&config.connect);
    let rendered = toml::to_string_pretty(&generated).context("serializing config to TOML")?;

    println!("# Save as ~/.piknik.toml (chmod 600) on every host sharing this clipboard.");
    println!("# The server only needs connect and psk.");
    println!();
    print!("{rendered}");
    Ok(())
}

// ── `piknik config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &PiknikConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
