//! # File I/O Module
//!
//! Panel definition files with safety features:
//! - **Atomic saves**: Write to .tmp, verify, rename to prevent corruption
//! - **Version validation**: Ensure schema compatibility
//!
//! ## File Format
//!
//! A panel file is JSON holding a [`PanelFile`]: the panel (geometry, layups,
//! buckling settings and optional trained surrogates) plus the strain state
//! to evaluate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use panel_core::file_io::{load_panel, save_panel};
//! use std::path::Path;
//!
//! let file = load_panel(Path::new("wing_cover.json"))?;
//! let values = file.panel.compute_failure_values(&file.strain)?;
//! println!("{}: aggregate failure {:.4}", file.label, values.aggregate);
//! save_panel(&file, Path::new("wing_cover_copy.json"))?;
//! # Ok::<(), panel_core::errors::PanelError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{PanelError, PanelResult};
use crate::panel::StiffenedPanel;

/// Current schema version of panel files
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Contents of a panel definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFile {
    pub schema_version: String,
    #[serde(default)]
    pub label: String,
    pub panel: StiffenedPanel,
    /// Shell strain `[e11, e22, g12, k11, k22, k12]`
    #[serde(default)]
    pub strain: [f64; 6],
}

impl PanelFile {
    pub fn new(label: impl Into<String>, panel: StiffenedPanel, strain: [f64; 6]) -> Self {
        PanelFile {
            schema_version: SCHEMA_VERSION.to_string(),
            label: label.into(),
            panel,
            strain,
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn parse(contents: &str, path: &Path) -> PanelResult<PanelFile> {
    serde_json::from_str(contents).map_err(|e| PanelError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Save a panel file with atomic write semantics.
///
/// The save process:
/// 1. Validate the panel and serialize to JSON
/// 2. Write to a temporary file (`<path>.tmp`) and sync to disk
/// 3. Read the temporary file back and parse it
/// 4. Rename it over `path`
pub fn save_panel(file: &PanelFile, path: &Path) -> PanelResult<()> {
    file.panel.validate()?;
    let json = serde_json::to_string_pretty(file).map_err(|e| PanelError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = tmp_path_for(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        PanelError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        PanelError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        PanelError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    let written = fs::read_to_string(&tmp_path).map_err(|e| {
        PanelError::file_error("verify temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    if let Err(e) = parse(&written, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PanelError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!("saved panel '{}' to {}", file.label, path.display());
    Ok(())
}

/// Load and validate a panel file.
///
/// # Returns
///
/// * `Err(PanelError::VersionMismatch)` - File version is incompatible
/// * `Err(PanelError::SerializationError)` - Invalid JSON
/// * `Err(PanelError::FileError)` - I/O error
/// * any validation error of the panel itself
pub fn load_panel(path: &Path) -> PanelResult<PanelFile> {
    let mut file = File::open(path).map_err(|e| {
        PanelError::file_error("open", path.display().to_string(), e.to_string())
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        PanelError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    let panel_file = parse(&contents, path)?;
    validate_version(&panel_file.schema_version)?;
    panel_file.panel.validate()?;
    debug!(
        "loaded panel '{}' with {} design variables",
        panel_file.label,
        panel_file.panel.num_design_vars()
    );
    Ok(panel_file)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> PanelResult<()> {
    let mismatch = || PanelError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    match (file_parts.first(), current_parts.first()) {
        // Major version must match
        (Some(file_major), Some(current_major)) if file_major == current_major => {}
        _ => return Err(mismatch()),
    }

    // Files from a newer minor version may use fields we do not know
    if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
        if file_minor > current_minor {
            return Err(mismatch());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::test_support::{gp_panel, sample_panel, sample_strain};
    use std::env::temp_dir;

    fn temp_panel_path(name: &str) -> PathBuf {
        temp_dir().join(format!("panel_core_test_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_panel_path("roundtrip");
        let file = PanelFile::new("wing cover", gp_panel(), sample_strain());
        save_panel(&file, &path).unwrap();

        let loaded = load_panel(&path).unwrap();
        assert_eq!(loaded, file);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_panel_path("atomic");
        let file = PanelFile::new("atomic", sample_panel(), sample_strain());
        save_panel(&file, &path).unwrap();

        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_rejects_invalid_panel() {
        let path = temp_panel_path("invalid");
        let mut panel = sample_panel();
        panel.panel_thickness.value = -1.0;
        let file = PanelFile::new("invalid", panel, [0.0; 6]);
        assert!(save_panel(&file, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_panel(Path::new("/nonexistent/panel.json"));
        assert!(matches!(result, Err(PanelError::FileError { .. })));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let path = temp_panel_path("bad_json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_panel(&path),
            Err(PanelError::SerializationError { .. })
        ));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("1.0.7").is_ok());
        assert!(validate_version("2.0.0").is_err());
        assert!(validate_version("1.1.0").is_err());
        assert!(validate_version("").is_err());
    }

    #[test]
    fn test_load_rejects_old_major() {
        let path = temp_panel_path("old_major");
        let mut file = PanelFile::new("old", sample_panel(), sample_strain());
        file.schema_version = "0.3.0".to_string();
        let json = serde_json::to_string(&file).unwrap();
        fs::write(&path, json).unwrap();
        assert!(matches!(
            load_panel(&path),
            Err(PanelError::VersionMismatch { .. })
        ));
        let _ = fs::remove_file(&path);
    }
}
