//! Shared helpers for command handlers.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use fwpath_core::{Snapshot, SnapshotDocument};

use crate::config::RunContext;
use crate::error::CliError;

/// Structured file formats accepted for snapshots and batch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Pick a format from the file extension. No extension means JSON.
    pub fn detect(path: &Path) -> Result<Self, CliError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some(_) => Err(CliError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

/// Read and deserialize a JSON, YAML or TOML file.
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let format = FileFormat::detect(path)?;
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    let parsed = match format {
        FileFormat::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        FileFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str(&contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| CliError::ParseFailed {
        path: path.display().to_string(),
        format: format.label(),
        reason,
    })
}

/// Load the reference data file and build an immutable snapshot from it.
pub fn load_snapshot(ctx: &RunContext) -> Result<Snapshot, CliError> {
    let document: SnapshotDocument = read_structured(&ctx.snapshot_path)?;
    let snapshot = Snapshot::build(&document, ctx.options.clone())?;

    debug!(
        path = %ctx.snapshot_path.display(),
        zones = snapshot.topology().zones().len(),
        firewalls = snapshot.topology().firewalls().len(),
        "snapshot loaded"
    );
    if !snapshot.issues().is_empty() {
        warn!(
            issues = snapshot.issues().len(),
            "reference data has issues; run `fwpath validate` for details"
        );
    }
    Ok(snapshot)
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = crate::output::render_json(value, false)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(FileFormat::detect(Path::new("lab.JSON")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::detect(Path::new("lab.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::detect(Path::new("lab.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(FileFormat::detect(Path::new("lab")).unwrap(), FileFormat::Json);
        assert!(matches!(
            FileFormat::detect(Path::new("lab.csv")),
            Err(CliError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn yaml_and_toml_snapshots_parse() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("lab.yaml");
        std::fs::write(
            &yaml,
            "zones:\n  - name: internal\n    networks: [10.0.0.0/8]\n    firewall: FW-01\n\
             firewalls:\n  - id: FW-01\n    zones: [internal]\n\
             policies:\n  FW-01:\n    - id: 1\n      action: accept\n",
        )
        .unwrap();
        let doc: SnapshotDocument = read_structured(&yaml).unwrap();
        assert_eq!(doc.zones.len(), 1);
        assert_eq!(doc.policies["FW-01"].len(), 1);

        let toml_path = dir.path().join("lab.toml");
        std::fs::write(
            &toml_path,
            "[[firewalls]]\nid = \"FW-01\"\n\n[[policies.FW-01]]\nid = \"allow\"\naction = \"accept\"\n",
        )
        .unwrap();
        let doc: SnapshotDocument = read_structured(&toml_path).unwrap();
        assert_eq!(doc.firewalls.len(), 1);
        assert_eq!(doc.policies["FW-01"][0].action.as_deref(), Some("accept"));
    }

    #[test]
    fn malformed_file_reports_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_structured::<SnapshotDocument>(&path).unwrap_err();
        assert!(matches!(err, CliError::ParseFailed { format: "JSON", .. }));
    }
}
