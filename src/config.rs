//! Tunable settings for import and export.
//!
//! Every field has a default, so an empty or partial YAML file is valid:
//!
//! ```yaml
//! assets_page: Original Assets
//! frame_margin: 80
//! path_root: assets
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LocframeError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name of the root-level page scanned for original image assets.
    pub assets_page: String,
    /// Size of the placeholder drawn when no asset matches.
    pub placeholder_width: f64,
    pub placeholder_height: f64,
    /// Size of the main frame created by an import.
    pub main_frame_width: f64,
    pub main_frame_height: f64,
    /// X offset of imported image frames and the vertical gap between them.
    pub frame_margin: f64,
    /// Path segment marking the root of the source tree. It and every
    /// segment before it are dropped when deriving folder keys.
    pub path_root: Option<String>,
    pub min_font_size: f64,
    pub max_font_size: f64,
    /// Font size of imported text as a fraction of its box height.
    pub font_scale: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assets_page: "Original Assets".to_string(),
            placeholder_width: 400.0,
            placeholder_height: 300.0,
            main_frame_width: 1200.0,
            main_frame_height: 800.0,
            frame_margin: 50.0,
            path_root: None,
            min_font_size: 12.0,
            max_font_size: 24.0,
            font_scale: 0.6,
        }
    }
}

impl Settings {
    /// Loads and validates settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self, LocframeError> {
        let data = fs::read_to_string(path).map_err(LocframeError::Io)?;
        Self::from_yaml_with_path(&data, path)
    }

    /// Loads settings from `path` if given, else returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, LocframeError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parses and validates settings from a YAML string.
    pub fn from_yaml_str(data: &str) -> Result<Self, LocframeError> {
        Self::from_yaml_with_path(data, Path::new("<string>"))
    }

    fn from_yaml_with_path(data: &str, path: &Path) -> Result<Self, LocframeError> {
        // An empty document deserializes as unit, not as an empty mapping
        let settings: Self = if data.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(data).map_err(|source| LocframeError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?
        };
        settings
            .validate()
            .map_err(|message| LocframeError::ConfigInvalid {
                path: PathBuf::from(path),
                message,
            })?;
        Ok(settings)
    }

    /// Checks the numeric fields: every size positive and finite, the
    /// margin non-negative, and the font range ordered.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("placeholder_width", self.placeholder_width),
            ("placeholder_height", self.placeholder_height),
            ("main_frame_width", self.main_frame_width),
            ("main_frame_height", self.main_frame_height),
            ("min_font_size", self.min_font_size),
            ("max_font_size", self.max_font_size),
            ("font_scale", self.font_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive number, got {}", name, value));
            }
        }
        if !self.frame_margin.is_finite() || self.frame_margin < 0.0 {
            return Err(format!(
                "frame_margin must be a non-negative number, got {}",
                self.frame_margin
            ));
        }
        if self.min_font_size > self.max_font_size {
            return Err(format!(
                "min_font_size ({}) is larger than max_font_size ({})",
                self.min_font_size, self.max_font_size
            ));
        }
        Ok(())
    }

    /// Font size for a text box of the given height.
    ///
    /// Bounded by `min_font_size` below and `max_font_size` above. Does not
    /// panic on unvalidated settings.
    pub fn font_size_for(&self, height: f64) -> f64 {
        (height * self.font_scale)
            .min(self.max_font_size)
            .max(self.min_font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml_str("frame_margin: 80\npath_root: assets\n").unwrap();
        assert_eq!(settings.frame_margin, 80.0);
        assert_eq!(settings.path_root.as_deref(), Some("assets"));
        assert_eq!(settings.assets_page, "Original Assets");
        assert_eq!(settings.placeholder_width, 400.0);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml_str("").unwrap(), Settings::default());
        assert_eq!(Settings::from_yaml_str("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Settings::from_yaml_str("frame_margn: 3").is_err());
    }

    #[test]
    fn test_font_size_is_clamped() {
        let settings = Settings::default();
        assert_eq!(settings.font_size_for(10.0), 12.0);
        assert!((settings.font_size_for(30.0) - 18.0).abs() < 1e-9);
        assert_eq!(settings.font_size_for(100.0), 24.0);
    }

    #[test]
    fn test_inverted_font_range_rejected() {
        match Settings::from_yaml_str("min_font_size: 30\nmax_font_size: 10\n") {
            Err(LocframeError::ConfigInvalid { message, .. }) => {
                assert!(message.contains("min_font_size"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_and_nan_values_rejected() {
        for yaml in [
            "font_scale: 0",
            "font_scale: .nan",
            "placeholder_width: -5",
            "main_frame_height: .inf",
            "frame_margin: -1",
        ] {
            assert!(
                matches!(
                    Settings::from_yaml_str(yaml),
                    Err(LocframeError::ConfigInvalid { .. })
                ),
                "accepted {}",
                yaml
            );
        }
        assert!(Settings::from_yaml_str("frame_margin: 0").is_ok());
    }

    #[test]
    fn test_font_size_never_panics_on_unvalidated_settings() {
        let settings = Settings {
            min_font_size: 30.0,
            max_font_size: 10.0,
            ..Settings::default()
        };
        assert_eq!(settings.font_size_for(20.0), 30.0);
    }

    #[test]
    fn test_load_reports_path_on_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_font_size: 30\nmax_font_size: 10").unwrap();
        match Settings::load(file.path()) {
            Err(LocframeError::ConfigInvalid { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frame_margin: [not, a, number]").unwrap();
        match Settings::load(file.path()) {
            Err(LocframeError::ConfigParse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
