//! monitor-toggle - One-click secondary monitor toggle
//!
//! Entry point for the command-line binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monitor_toggle::config::Config;
use monitor_toggle::multimon::{
    DisplayConfigService, LoggingObserver, MonitorToggle, PersistenceMode, ToggleObserver,
    ToggleOutcome, ToggleView,
};
use monitor_toggle::mutter::{self, MutterDisplayConfig};
use monitor_toggle::utils::{detect_desktop, format_user_error, log_startup_diagnostics};

/// Command-line arguments for monitor-toggle
#[derive(Parser, Debug)]
#[command(name = "monitor-toggle")]
#[command(version, about = "Toggle a secondary monitor on GNOME/Mutter desktops", long_about = None)]
pub struct Args {
    /// Configuration file path (default: $XDG_CONFIG_HOME/monitor-toggle/config.toml)
    #[arg(short, long, env = "MONITOR_TOGGLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show connected monitors and the toggle state
    Status {
        /// Print the toggle state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Turn the selected monitor on or off
    Toggle {
        /// Connector to toggle (e.g. HDMI-1)
        #[arg(short, long, env = "MONITOR_TOGGLE_MONITOR")]
        monitor: Option<String>,

        /// Persistence mode (verify|temporary|persistent)
        #[arg(long)]
        mode: Option<PersistenceMode>,
    },

    /// Check a connector and show its state
    Select {
        /// Connector name (e.g. DP-2)
        connector: String,
    },

    /// Follow monitor changes until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first so its log level applies
    let config_path = Config::locate(args.config.as_deref())?;
    let loaded = config_path.as_ref().map(Config::load);
    let config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => Config::default_config(),
    };

    let _log_guard = init_logging(&args, &config.logging.level)?;

    debug!("════════════════════════════════════════════════════════");
    debug!("  monitor-toggle v{}", env!("CARGO_PKG_VERSION"));
    debug!("  Commit: {}", env!("GIT_HASH"));
    debug!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    debug!("════════════════════════════════════════════════════════");

    if args.verbose > 0 {
        log_startup_diagnostics();
    }

    match (&loaded, &config_path) {
        (Some(Err(e)), Some(path)) => {
            warn!("Failed to load config {}: {:#}, using defaults", path.display(), e)
        }
        (Some(Ok(_)), Some(path)) => info!("Configuration loaded from {}", path.display()),
        _ => debug!("No configuration file, using defaults"),
    }

    if let Err(e) = run(args.command, config).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    Ok(())
}

async fn run(command: Command, config: Config) -> Result<()> {
    let config = match &command {
        Command::Toggle { monitor, mode } => config.with_overrides(monitor.clone(), *mode),
        _ => config,
    };
    config.validate()?;
    debug!("Config: {:?}", config);

    let service = connect().await?;

    match command {
        Command::Status { json } => {
            let toggle = MonitorToggle::new(service, Arc::new(LoggingObserver), &config);
            toggle.refresh().await?;
            print_view(&toggle.view(), json)?;
        }
        Command::Toggle { .. } => {
            let toggle = MonitorToggle::new(service, Arc::new(LoggingObserver), &config);
            toggle.refresh().await?;

            let outcome = toggle.toggle().await?;
            match &outcome {
                ToggleOutcome::PrimaryProtected(_) | ToggleOutcome::Busy => {
                    warn!("{}", outcome);
                    println!("{}", outcome);
                }
                _ => {
                    println!("{}", outcome);
                    // Report the state the desktop settled on
                    toggle.settled().await;
                    print_view(&toggle.view(), false)?;
                }
            }
        }
        Command::Select { connector } => {
            let toggle = MonitorToggle::new(service, Arc::new(LoggingObserver), &config);
            toggle.refresh().await?;
            toggle.select_monitor(&connector).await?;
            print_view(&toggle.view(), false)?;
        }
        Command::Watch => watch(service, &config).await?,
    }

    Ok(())
}

/// Session bus proxy for the display configuration service
async fn connect() -> Result<Arc<MutterDisplayConfig>> {
    if !mutter::is_display_config_available().await {
        anyhow::bail!(
            "Mutter DisplayConfig D-Bus service not available (desktop: {})",
            detect_desktop().unwrap_or_else(|| "unknown".to_string())
        );
    }

    let connection = zbus::Connection::session()
        .await
        .context("Failed to connect to D-Bus session bus")?;
    let display_config = MutterDisplayConfig::new(&connection).await?;
    Ok(Arc::new(display_config))
}

async fn watch(display_config: Arc<MutterDisplayConfig>, config: &Config) -> Result<()> {
    let changes = display_config.receive_monitors_changed().await?;
    futures_util::pin_mut!(changes);

    let observer: Arc<dyn ToggleObserver> = Arc::new(|view: &ToggleView| {
        if let Err(e) = print_view(view, false) {
            warn!("Failed to print state: {}", e);
        }
    });
    let service: Arc<dyn DisplayConfigService> = display_config.clone();
    let toggle = MonitorToggle::new(service, observer, config);

    toggle.refresh().await?;
    info!("Watching for monitor changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            change = changes.next() => {
                let Some(_) = change else {
                    warn!("MonitorsChanged stream ended");
                    break;
                };
                debug!("MonitorsChanged received");
                if let Err(e) = toggle.refresh().await {
                    warn!("Refresh after change failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    toggle.shutdown();
    Ok(())
}

fn print_view(view: &ToggleView, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(view).context("Failed to serialize state")?
        );
        return Ok(());
    }

    println!(
        "{} [{}]{}",
        view.subtitle,
        if view.checked { "on" } else { "off" },
        if view.sensitive { "" } else { " (unavailable)" }
    );
    println!(
        "Persistence: {} - {}",
        view.persistence_mode, view.persistence_description
    );
    for entry in &view.monitors {
        println!(
            "  {} {:<10} {:<3} {:<22} {}{}",
            if entry.selected { "*" } else { " " },
            entry.connector,
            if entry.active { "on" } else { "off" },
            entry.resolution.as_deref().unwrap_or("-"),
            entry.name,
            if entry.primary { " [primary]" } else { "" }
        );
    }

    Ok(())
}

fn init_logging(args: &Args, config_level: &str) -> Result<Option<WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // zbus at debug logs every message on the bus
        tracing_subscriber::EnvFilter::new(format!(
            "monitor_toggle={level},zbus=warn,warn",
            level = log_level
        ))
    });

    // If log file is specified, write to both stderr and file
    let (file_writer, guard) = match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    match args.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
    }

    if let Some(path) = &args.log_file {
        info!("Logging to file: {}", path.display());
    }

    Ok(guard)
}
