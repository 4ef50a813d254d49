//! TOML configuration.
//!
//! ```toml
//! [catalog]
//! path = "./data/catalog.json"
//!
//! [aliases]
//! path = "./data/aliases.json"
//!
//! [engine]
//! plan = "pro"
//! keyword_top_k = 20
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use storefront_brain_core::models::PlanTier;
use storefront_brain_core::settings::EngineSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub aliases: AliasesConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AliasesConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_plan")]
    pub plan: String,
    #[serde(default = "default_keyword_top_k")]
    pub keyword_top_k: usize,
    #[serde(default = "default_moderate_mismatch_ratio")]
    pub moderate_mismatch_ratio: f64,
    #[serde(default = "default_suspicious_budget_threshold")]
    pub suspicious_budget_threshold: f64,
    #[serde(default = "default_budget_ratio")]
    pub very_low_budget_ratio: f64,
    #[serde(default = "default_budget_ratio")]
    pub budget_clear_ratio: f64,
}

fn default_plan() -> String {
    "pro".to_string()
}
fn default_keyword_top_k() -> usize {
    20
}
fn default_moderate_mismatch_ratio() -> f64 {
    3.0
}
fn default_suspicious_budget_threshold() -> f64 {
    2000.0
}
fn default_budget_ratio() -> f64 {
    1.5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plan: default_plan(),
            keyword_top_k: default_keyword_top_k(),
            moderate_mismatch_ratio: default_moderate_mismatch_ratio(),
            suspicious_budget_threshold: default_suspicious_budget_threshold(),
            very_low_budget_ratio: default_budget_ratio(),
            budget_clear_ratio: default_budget_ratio(),
        }
    }
}

impl EngineConfig {
    /// The configured plan tier. Validated by [`load_config`].
    pub fn plan_tier(&self) -> PlanTier {
        self.plan.parse().unwrap_or_default()
    }

    /// Engine tunables; anything not configurable keeps its default.
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            keyword_top_k: self.keyword_top_k,
            moderate_mismatch_ratio: self.moderate_mismatch_ratio,
            suspicious_budget_threshold: self.suspicious_budget_threshold,
            very_low_budget_ratio: self.very_low_budget_ratio,
            budget_clear_ratio: self.budget_clear_ratio,
            ..EngineSettings::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate engine
    let engine = &config.engine;
    if engine.keyword_top_k < 1 {
        bail!("engine.keyword_top_k must be >= 1");
    }
    for (key, value) in [
        ("engine.moderate_mismatch_ratio", engine.moderate_mismatch_ratio),
        ("engine.very_low_budget_ratio", engine.very_low_budget_ratio),
        ("engine.budget_clear_ratio", engine.budget_clear_ratio),
    ] {
        if value <= 1.0 {
            bail!("{} must be > 1.0", key);
        }
    }
    if engine.suspicious_budget_threshold <= 0.0 {
        bail!("engine.suspicious_budget_threshold must be > 0");
    }
    if let Err(e) = engine.plan.parse::<PlanTier>() {
        bail!("engine.plan: {}", e);
    }

    // Resolve relative paths against the config file location
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.catalog.path = resolve(base, &config.catalog.path);
    config.aliases.path = config.aliases.path.as_deref().map(|p| resolve(base, p));

    Ok(config)
}

const CONFIG_TEMPLATE: &str = r#"# Storefront Brain configuration.
# Relative paths are resolved against this file's directory.

[catalog]
path = "../data/catalog.json"

[aliases]
# path = "../data/aliases.json"

[engine]
plan = "pro"              # starter | pro | enterprise
keyword_top_k = 20
moderate_mismatch_ratio = 3.0
suspicious_budget_threshold = 2000.0
very_low_budget_ratio = 1.5
budget_clear_ratio = 1.5

[logging]
level = "info"            # overridden by RUST_LOG
"#;

/// Write a commented starter config to `path`. Refuses to overwrite.
pub fn scaffold_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("sb.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[catalog]\npath = \"catalog.json\"\n");
        let config = load_config(&path).unwrap();

        assert_eq!(config.catalog.path, tmp.path().join("catalog.json"));
        assert!(config.aliases.path.is_none());
        assert_eq!(config.engine.plan_tier(), PlanTier::Pro);
        assert_eq!(config.engine.settings(), EngineSettings::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_engine_overrides() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[catalog]
path = "/data/catalog.json"

[engine]
plan = "enterprise"
keyword_top_k = 5
moderate_mismatch_ratio = 2.5
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.catalog.path, PathBuf::from("/data/catalog.json"));
        assert_eq!(config.engine.plan_tier(), PlanTier::Enterprise);
        let settings = config.engine.settings();
        assert_eq!(settings.keyword_top_k, 5);
        assert_eq!(settings.moderate_mismatch_ratio, 2.5);
        assert_eq!(settings.suspicious_budget_threshold, 2000.0);
    }

    #[test]
    fn test_validation_errors_name_the_key() {
        let tmp = TempDir::new().unwrap();
        let cases = [
            ("keyword_top_k = 0", "engine.keyword_top_k"),
            ("budget_clear_ratio = 1.0", "engine.budget_clear_ratio"),
            ("suspicious_budget_threshold = -1.0", "engine.suspicious_budget_threshold"),
            ("plan = \"gold\"", "engine.plan"),
        ];
        for (line, key) in cases {
            let path = write_config(
                &tmp,
                &format!("[catalog]\npath = \"c.json\"\n\n[engine]\n{}\n", line),
            );
            let err = load_config(&path).unwrap_err().to_string();
            assert!(err.contains(key), "{} -> {}", line, err);
        }
    }

    #[test]
    fn test_scaffold_loads_and_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config").join("sb.toml");
        scaffold_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.catalog.path,
            tmp.path().join("config").join("../data/catalog.json")
        );
        assert_eq!(config.engine.settings(), EngineSettings::default());

        let err = scaffold_config(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/sb.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
