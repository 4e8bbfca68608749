use anyhow::Result;
use chrono::{DateTime, FixedOffset, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::pump::{snapshot, PumpSnapshot};
use crate::status::{StatusInputs, StatusLine};

/// How long transient messages stay in the info line
const STATUS_MESSAGE_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub popup: Popup,
    pub config: AppConfig,

    pub snapshot_path: PathBuf,
    pub snapshot: PumpSnapshot,
    /// Last snapshot error, cleared on the next good load
    pub load_error: Option<String>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    /// Reference time for the countdown, advanced every tick
    pub now: DateTime<Utc>,
    pub last_reload: Instant,
}

impl App {
    pub async fn new(snapshot_override: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load().unwrap_or_default();
        let snapshot_path = snapshot_override.unwrap_or_else(|| config.snapshot_path());

        let mut app = Self {
            popup: Popup::None,
            config,
            snapshot_path,
            snapshot: PumpSnapshot::default(),
            load_error: None,
            status_message: None,
            status_message_time: None,
            now: Utc::now(),
            last_reload: Instant::now(),
        };
        app.reload().await;
        Ok(app)
    }

    /// Re-read the snapshot. A failed read keeps the last good snapshot.
    pub async fn reload(&mut self) {
        match snapshot::load(&self.snapshot_path).await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.load_error = None;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.load_error = Some(e.to_string());
            }
        }
        self.last_reload = Instant::now();
    }

    pub fn local_offset() -> FixedOffset {
        *Local::now().offset()
    }

    pub fn status_line(&self) -> StatusLine {
        StatusLine::render(&StatusInputs {
            snapshot: &self.snapshot,
            now: self.now,
            local_offset: Self::local_offset(),
            hide_insulin_badge: self.config.hide_insulin_badge,
            pod_markers: &self.config.pod_markers,
        })
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::Enter) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('r') => {
                self.reload().await;
                if self.load_error.is_none() {
                    self.set_status("Snapshot reloaded");
                }
            }
            KeyCode::Char('b') => {
                self.update_config(|c| c.hide_insulin_badge = !c.hide_insulin_badge, AppConfig::save)?;
                self.set_status(if self.config.hide_insulin_badge {
                    "Insulin badge hidden"
                } else {
                    "Insulin badge shown"
                });
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    /// Apply a config change only once it has been saved
    fn update_config(
        &mut self,
        change: impl FnOnce(&mut AppConfig),
        save: impl FnOnce(&AppConfig) -> Result<()>,
    ) -> Result<()> {
        let mut updated = self.config.clone();
        change(&mut updated);
        save(&updated)?;
        self.config = updated;
        Ok(())
    }

    pub async fn tick(&mut self) -> Result<()> {
        self.now = Utc::now();

        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        if self.last_reload.elapsed() >= Duration::from_secs(self.config.refresh_secs.max(1)) {
            self.reload().await;
        }
        Ok(())
    }
}
