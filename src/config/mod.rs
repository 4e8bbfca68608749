use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_pod_markers() -> Vec<String> {
    vec!["Omni".to_string()]
}

fn default_refresh_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hide the U200/U50 badge for non-standard insulin
    #[serde(default)]
    pub hide_insulin_badge: bool,

    /// Pump name fragments that identify tubeless pods
    #[serde(default = "default_pod_markers")]
    pub pod_markers: Vec<String>,

    /// Where the loop app writes the pump snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    /// Seconds between snapshot reloads
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Desktop notifications from the daemon
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hide_insulin_badge: false,
            pod_markers: default_pod_markers(),
            snapshot_path: None,
            refresh_secs: default_refresh_secs(),
            notifications: true,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("podbar");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => return Ok(config.cleaned()),
                    Err(e) => {
                        // Keep the user's file untouched so they can fix it
                        tracing::warn!("Failed to parse config: {}", e);
                        return Ok(AppConfig::default());
                    }
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(&self.cleaned())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Snapshot file to read, falling back to the state dir
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(crate::pump::snapshot::default_path)
    }

    fn cleaned(&self) -> Self {
        let mut clean = self.clone();
        clean.pod_markers.retain(|m| !m.trim().is_empty());
        clean.refresh_secs = clean.refresh_secs.max(1);
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            hide_insulin_badge: true,
            pod_markers: vec!["Omni".to_string(), "Medtrum".to_string()],
            snapshot_path: Some(PathBuf::from("/run/user/1000/pump.json")),
            refresh_secs: 10,
            notifications: false,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = toml::from_str("hide_insulin_badge = true").unwrap();
        assert!(config.hide_insulin_badge);
        assert_eq!(config.pod_markers, vec!["Omni".to_string()]);
        assert_eq!(config.refresh_secs, 5);
        assert!(config.notifications);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_cleaned_drops_blank_markers_and_zero_refresh() {
        let config = AppConfig {
            pod_markers: vec!["".to_string(), "  ".to_string(), "Omni".to_string()],
            refresh_secs: 0,
            ..Default::default()
        };
        let clean = config.cleaned();
        assert_eq!(clean.pod_markers, vec!["Omni".to_string()]);
        assert_eq!(clean.refresh_secs, 1);
    }

    #[test]
    fn test_snapshot_path_override() {
        let config = AppConfig {
            snapshot_path: Some(PathBuf::from("/tmp/pump.json")),
            ..Default::default()
        };
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/pump.json"));
        assert!(AppConfig::default().snapshot_path().ends_with("podbar/pump.json"));
    }
}
