//! Configuration file support for schooldash
//!
//! Loads dashboard configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.schooldashrc.json` next to the dataset
//! 3. `schooldash.config.json` next to the dataset
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::normalize::Sentinels;
use crate::paginate::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_CHOICES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names searched for during discovery, in priority order
const CONFIG_FILE_NAMES: &[&str] = &[".schooldashrc.json", "schooldash.config.json"];

/// Default suffix appended to years in display labels
const DEFAULT_YEAR_SUFFIX: &str = "年度";

/// Dashboard configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Rows per table page (default: 25)
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Page sizes the user may pick from (default: 10, 25, 50, 100)
    #[serde(default)]
    pub page_size_choices: Option<Vec<usize>>,

    /// Label marking duplicate total rows (default: "合計")
    #[serde(default)]
    pub total_label: Option<String>,

    /// Gender type of male student counts (default: "男")
    #[serde(default)]
    pub male_label: Option<String>,

    /// Gender type of female student counts (default: "女")
    #[serde(default)]
    pub female_label: Option<String>,

    /// Suffix for year display labels (default: "年度")
    #[serde(default)]
    pub year_suffix: Option<String>,
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub page_size: usize,
    pub page_size_choices: Vec<usize>,
    pub sentinels: Sentinels,
    pub year_suffix: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        let choices = self.choices();

        if choices.is_empty() {
            anyhow::bail!("page_size_choices must not be empty");
        }
        if let Some(zero) = choices.iter().find(|&&c| c == 0) {
            anyhow::bail!("page_size_choices must be at least 1 (got {})", zero);
        }
        if choices.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!(
                "page_size_choices must be strictly ascending (got {:?})",
                choices
            );
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !choices.contains(&page_size) {
            anyhow::bail!(
                "page_size ({}) must be one of page_size_choices {:?}",
                page_size,
                choices
            );
        }

        for (name, value) in [
            ("total_label", &self.total_label),
            ("male_label", &self.male_label),
            ("female_label", &self.female_label),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    anyhow::bail!("{} must not be empty", name);
                }
            }
        }

        if let (Some(male), Some(female)) = (&self.male_label, &self.female_label) {
            if male == female {
                anyhow::bail!(
                    "male_label and female_label must differ (both are {:?})",
                    male
                );
            }
        }

        Ok(())
    }

    fn choices(&self) -> Vec<usize> {
        self.page_size_choices
            .clone()
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE_CHOICES.to_vec())
    }

    /// Resolve config into the form the session uses
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let defaults = Sentinels::default();
        let sentinels = Sentinels {
            total: self.total_label.clone().unwrap_or(defaults.total),
            male: self.male_label.clone().unwrap_or(defaults.male),
            female: self.female_label.clone().unwrap_or(defaults.female),
        };

        Ok(ResolvedConfig {
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            page_size_choices: self.choices(),
            sentinels,
            year_suffix: self
                .year_suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_YEAR_SUFFIX.to_string()),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        DashboardConfig::default().resolve()
    }

    /// Check a requested page size against the allowed choices
    pub fn check_page_size(&self, page_size: usize) -> Result<usize> {
        if self.page_size_choices.contains(&page_size) {
            Ok(page_size)
        } else {
            anyhow::bail!(
                "page size {} is not one of {:?}",
                page_size,
                self.page_size_choices
            )
        }
    }

    /// Display label for a year, e.g. "2020年度"
    pub fn year_label(&self, year: i64) -> String {
        format!("{}{}", year, self.year_suffix)
    }
}

/// Discover and load a config file from a directory
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(dir: &Path) -> Result<Option<(DashboardConfig, PathBuf)>> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DashboardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: DashboardConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `search_dir`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(search_dir: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(search_dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (DashboardConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.page_size, 25);
        assert_eq!(resolved.page_size_choices, vec![10, 25, 50, 100]);
        assert_eq!(resolved.sentinels, Sentinels::default());
        assert_eq!(resolved.year_suffix, "年度");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "page_size": 20,
            "page_size_choices": [5, 20, 40],
            "total_label": "Total",
            "male_label": "M",
            "female_label": "F",
            "year_suffix": ""
        }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.page_size, 20);
        assert_eq!(resolved.page_size_choices, vec![5, 20, 40]);
        assert_eq!(resolved.sentinels.total, "Total");
        assert_eq!(resolved.sentinels.male, "M");
        assert_eq!(resolved.sentinels.female, "F");
        assert_eq!(resolved.year_label(2020), "2020");
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<DashboardConfig, _> = serde_json::from_str(r#"{"unknown": 1}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_page_size_outside_choices() {
        let config: DashboardConfig = serde_json::from_str(r#"{"page_size": 30}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_choices() {
        for json in [
            r#"{"page_size_choices": []}"#,
            r#"{"page_size_choices": [0, 25]}"#,
            r#"{"page_size_choices": [50, 25]}"#,
        ] {
            let config: DashboardConfig = serde_json::from_str(json).unwrap();
            assert!(config.validate().is_err(), "should reject {}", json);
        }
    }

    #[test]
    fn test_reject_empty_or_equal_labels() {
        let config: DashboardConfig = serde_json::from_str(r#"{"total_label": " "}"#).unwrap();
        assert!(config.validate().is_err());

        let config: DashboardConfig =
            serde_json::from_str(r#"{"male_label": "X", "female_label": "X"}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_page_size() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert_eq!(resolved.check_page_size(50).unwrap(), 50);
        assert!(resolved.check_page_size(7).is_err());
    }

    #[test]
    fn test_year_label() {
        let resolved = ResolvedConfig::defaults().unwrap();
        assert_eq!(resolved.year_label(2021), "2021年度");
    }

    #[test]
    fn test_discover_rc_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".schooldashrc.json");
        fs::write(&config_path, r#"{"page_size": 50}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.page_size, Some(50));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".schooldashrc.json"), r#"{"page_size": 10}"#).unwrap();
        fs::write(
            dir.path().join("schooldash.config.json"),
            r#"{"page_size": 100}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.page_size,
            Some(10),
            ".schooldashrc.json should take priority"
        );
    }

    #[test]
    fn test_no_config_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schooldash.config.json");
        fs::write(&path, r#"{"page_size": 3}"#).unwrap();
        assert!(discover_config(dir.path()).is_err());
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.page_size, 25);
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"year_suffix": " FY"}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.year_label(2020), "2020 FY");
        assert_eq!(resolved.config_path, Some(config_path));
    }
}
