#![forbid(unsafe_code)]

mod activation;
mod constants;
mod debounce;
mod ipc;
mod overlay;
mod panel;
mod presets;
mod settings;
mod shade;
mod store;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use ipc::{DaemonClient, DaemonResponse, PanelRequest};
use panel::{Controller, IpcPreviewPush};
use store::SettingsStore;

#[derive(Parser)]
#[command(name = "eyeshade", version)]
#[command(about = "Warm screen shade with daily schedules and per-site exceptions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the shade daemon that renders the tint
    Daemon {
        /// Host identity used for site exceptions (default: machine hostname)
        #[arg(long)]
        host: Option<String>,
        /// Override the control socket path
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Show the current shade status
    Status,
    /// Ask a running shade daemon to exit
    Stop,
    /// Turn the shade on
    On,
    /// Turn the shade off
    Off,
    /// Select a color preset
    Preset {
        /// One of: sunset, amber, forest, ocean, charcoal, night
        key: String,
    },
    /// Shade with a custom color
    Color {
        /// Hex color, e.g. "#f4e9d8"
        hex: String,
    },
    /// Set the shade intensity as a percentage (0-75)
    Intensity { percent: f64 },
    /// Pause the shade for a while
    Snooze {
        #[arg(default_value_t = 30)]
        minutes: u32,
    },
    /// End a running snooze
    Resume,
    /// Toggle the exception for the currently shaded host
    Site,
    /// Configure the daily off window
    Daily {
        #[command(subcommand)]
        action: DailyAction,
    },
}

#[derive(Subcommand)]
enum DailyAction {
    /// Enable the daily off window
    On,
    /// Disable the daily off window
    Off,
    /// Set the window bounds (HH:MM, may cross midnight)
    Window { start: String, end: String },
}

fn run_panel_command(command: Command) -> Result<()> {
    let socket = ipc::default_socket_path()?;
    let store = SettingsStore::open(SettingsStore::default_path());
    let host = panel::detect_host(&socket);
    let mut controller = Controller::new(store, IpcPreviewPush::new(socket.clone()), host);

    let mutated = match command {
        Command::Status => {
            let reachable = matches!(
                DaemonClient::connect_to(&socket)
                    .and_then(|mut client| client.request(PanelRequest::Ping)),
                Ok(DaemonResponse::Pong)
            );
            println!("Daemon: {}", if reachable { "running" } else { "not running" });
            false
        }
        Command::Stop => {
            match DaemonClient::connect_to(&socket)
                .and_then(|mut client| client.request(PanelRequest::Shutdown))
            {
                Ok(_) => println!("Daemon stopped"),
                Err(e) => println!("No daemon to stop ({e:#})"),
            }
            false
        }
        Command::On => {
            controller.set_enabled(true);
            true
        }
        Command::Off => {
            controller.set_enabled(false);
            true
        }
        Command::Preset { key } => {
            controller.select_preset(&key)?;
            true
        }
        Command::Color { hex } => {
            controller.use_custom_color(&hex);
            true
        }
        Command::Intensity { percent } => {
            controller.set_intensity(percent / 100.0);
            true
        }
        Command::Snooze { minutes } => {
            controller.snooze(minutes, Local::now());
            true
        }
        Command::Resume => {
            controller.resume();
            true
        }
        Command::Site => {
            let toggled = controller.toggle_site_exception();
            if !toggled {
                println!("No shaded host known; is the daemon running?");
            }
            toggled
        }
        Command::Daily { action } => {
            match action {
                DailyAction::On => controller.set_daily_off_enabled(true),
                DailyAction::Off => controller.set_daily_off_enabled(false),
                DailyAction::Window { start, end } => {
                    controller.set_daily_off_window(&start, &end);
                }
            }
            true
        }
        Command::Daemon { .. } => unreachable!("handled in main"),
    };

    if mutated {
        controller.commit();
    }
    println!("{}", controller.status_line(Local::now()));
    println!(
        "Preset: {} at {:.0}%",
        panel::preset_label(controller.settings()),
        controller.settings().intensity * 100.0
    );
    println!("{}", controller.site_label());
    Ok(())
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Daemon { host, socket } => {
            let socket = match socket {
                Some(path) => path,
                None => ipc::default_socket_path()?,
            };
            let host = host.or_else(shade::detect_host);
            if host.is_none() {
                info!("No host identity detected; site exceptions disabled");
            }
            shade::run_shade_daemon(host, socket, SettingsStore::default_path())
        }
        command => run_panel_command(command),
    }
}
