//! Reading the pump snapshot file written by the loop app

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::PumpSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Default snapshot location: $XDG_STATE_HOME/podbar/pump.json
pub fn default_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("podbar")
        .join("pump.json")
}

/// Parse snapshot JSON
pub fn parse(content: &str, path: &Path) -> Result<PumpSnapshot, SnapshotError> {
    serde_json::from_str(content).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the snapshot. A missing file means no pump is paired yet.
pub async fn load(path: &Path) -> Result<PumpSnapshot, SnapshotError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let snapshot = parse(&content, path)?;
            tracing::debug!("Loaded pump snapshot from {}", path.display());
            Ok(snapshot)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No pump snapshot at {}", path.display());
            Ok(PumpSnapshot::default())
        }
        Err(source) => Err(SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pump::{Battery, Reservoir};

    const POD_JSON: &str = r#"{
        "name": "Omnipod DASH",
        "reservoir": 3735928559,
        "expires_at": "2026-10-18T08:00:00Z",
        "utc_offset_secs": 7200,
        "concentrations": [
            {"date": "2026-01-01T00:00:00Z", "concentration": 1.0},
            {"date": "2026-03-01T00:00:00Z", "concentration": 2.0}
        ]
    }"#;

    #[test]
    fn test_parse_pod_snapshot() {
        let snapshot = parse(POD_JSON, Path::new("pump.json")).unwrap();
        assert_eq!(snapshot.name, "Omnipod DASH");
        assert_eq!(snapshot.reservoir, Some(Reservoir::Overfull));
        assert!(snapshot.battery.is_none());
        assert!(snapshot.expires_at.is_some());
        assert_eq!(snapshot.concentration(), 2.0);
    }

    #[test]
    fn test_parse_tubed_pump_snapshot() {
        let json = r#"{"name": "Dana-i", "reservoir": 87.4, "battery": {"percent": 55}}"#;
        let snapshot = parse(json, Path::new("pump.json")).unwrap();
        assert_eq!(snapshot.reservoir, Some(Reservoir::Known(87.4)));
        assert_eq!(snapshot.battery, Some(Battery { percent: Some(55) }));
        assert!(snapshot.concentrations.is_empty());
    }

    #[test]
    fn test_parse_empty_object() {
        let snapshot = parse("{}", Path::new("pump.json")).unwrap();
        assert_eq!(snapshot, PumpSnapshot::default());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse("{not json", Path::new("/tmp/pump.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
        assert!(err.to_string().contains("/tmp/pump.json"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load(&dir.path().join("missing.json")).await.unwrap();
        assert_eq!(snapshot, PumpSnapshot::default());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pump.json");
        std::fs::write(&path, POD_JSON).unwrap();

        let snapshot = load(&path).await.unwrap();
        assert_eq!(snapshot.utc_offset_secs, Some(7200));
    }

    #[test]
    fn test_serialize_keeps_sentinel_on_the_wire() {
        let snapshot = PumpSnapshot {
            reservoir: Some(Reservoir::Overfull),
            ..Default::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("3735928559"));
    }
}
