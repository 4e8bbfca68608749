mod app;
mod config;
mod monitor;
mod pump;
mod status;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{App, Popup};
use config::AppConfig;
use status::{severity, Severity, StatusInputs, StatusLine};

#[derive(Parser, Debug)]
#[command(name = "podbar")]
#[command(version)]
#[command(about = "A terminal status bar for insulin pumps and pods")]
struct Args {
    /// Output current pump status as JSON (for waybar)
    #[arg(short, long)]
    status: bool,

    /// Print the status line once as plain text
    #[arg(short, long)]
    once: bool,

    /// Run in daemon mode (desktop notifications)
    #[arg(short, long)]
    daemon: bool,

    /// Read the pump snapshot from this file
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let tui = !(args.status || args.once || args.daemon);
    init_logging(tui);

    if args.status {
        return print_status(args.snapshot).await;
    }

    if args.once {
        return print_once(args.snapshot).await;
    }

    if args.daemon {
        return monitor::start_monitoring(args.snapshot).await;
    }

    run_tui(args.snapshot).await
}

/// The TUI owns the terminal, so its logs go to a file
fn init_logging(tui: bool) {
    let log_file = if tui { open_log_file() } else { None };
    let (file_layer, stderr_layer) = match log_file {
        Some(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        None if tui => (None, None),
        None => (None, Some(fmt::layer().with_writer(io::stderr))),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(EnvFilter::from_default_env())
        .init();
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::state_dir().or_else(dirs::cache_dir)?.join("podbar");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("podbar.log"))
        .ok()
}

async fn load_status(snapshot_override: Option<PathBuf>) -> Result<(pump::PumpSnapshot, AppConfig)> {
    let config = AppConfig::load().unwrap_or_default();
    let path = snapshot_override.unwrap_or_else(|| config.snapshot_path());
    let snapshot = pump::snapshot::load(&path)
        .await
        .with_context(|| format!("Could not load pump snapshot from {}", path.display()))?;
    Ok((snapshot, config))
}

fn render(snapshot: &pump::PumpSnapshot, config: &AppConfig, now: chrono::DateTime<chrono::Utc>) -> StatusLine {
    StatusLine::render(&StatusInputs {
        snapshot,
        now,
        local_offset: App::local_offset(),
        hide_insulin_badge: config.hide_insulin_badge,
        pod_markers: &config.pod_markers,
    })
}

async fn print_once(snapshot_override: Option<PathBuf>) -> Result<()> {
    let (snapshot, config) = load_status(snapshot_override).await?;
    println!("{}", render(&snapshot, &config, chrono::Utc::now()).plain_text());
    Ok(())
}

/// Waybar custom module output
fn waybar_json(snapshot: &pump::PumpSnapshot, config: &AppConfig, now: chrono::DateTime<chrono::Utc>) -> serde_json::Value {
    let line = render(snapshot, config, now);

    let expiry = severity::expiry_severity(snapshot.expires_at, now);
    let reservoir = severity::reservoir_severity(snapshot.reservoir);
    let battery = if snapshot.is_pod_style(&config.pod_markers) {
        Severity::Unknown
    } else {
        severity::battery_severity(snapshot.battery.as_ref())
    };
    let class = Severity::worst([expiry, reservoir, battery]);

    let mut tooltip = Vec::new();
    if !snapshot.name.is_empty() {
        tooltip.push(snapshot.name.clone());
    }
    if let Some(expires_at) = snapshot.expires_at {
        tooltip.push(format!(
            "Pod expires {}",
            expires_at.with_timezone(&chrono::Local).format("%a %H:%M")
        ));
    }
    if let Some(percent) = snapshot.battery.as_ref().and_then(|b| b.percent) {
        tooltip.push(format!("Battery {}%", percent));
    }
    if tooltip.is_empty() {
        tooltip.push("No pump data".to_string());
    }

    serde_json::json!({
        "text": line.plain_text(),
        "tooltip": tooltip.join("\n"),
        "class": class.class(),
        "alt": class.class(),
        "expired": snapshot.expires_at.is_some_and(|e| e <= now),
        "reservoir": snapshot
            .reservoir
            .and_then(|r| r.units())
            .map(|units| units * snapshot.concentration()),
        "overfull": snapshot.reservoir == Some(pump::Reservoir::Overfull),
        "battery": snapshot.battery.as_ref().and_then(|b| b.percent),
    })
}

async fn print_status(snapshot_override: Option<PathBuf>) -> Result<()> {
    let (snapshot, config) = load_status(snapshot_override).await?;
    let output = waybar_json(&snapshot, &config, chrono::Utc::now());
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn run_tui(snapshot_override: Option<PathBuf>) -> Result<()> {
    // Create app state before taking over the terminal
    let mut app = App::new(snapshot_override).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key).await {
                                app.set_status(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        let _ = app.tick().await;
    }
}
