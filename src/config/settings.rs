use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::Argon2Params;
use crate::errors::{KoshError, Result};

/// Environment variable that overrides the default data directory.
pub const HOME_ENV: &str = "KOSH_HOME";

/// Directory name used under `$HOME` when nothing else is given.
const DEFAULT_DIR_NAME: &str = ".kosh";

/// User configuration, loaded from `<data_dir>/config.toml`.
///
/// Every field has a default so kosh works without any config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 1).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// Candidates scoring below this are dropped from search results.
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// When any access count passes this value, every count is lowered by
    /// it. `0` turns the reset off.
    #[serde(default = "default_access_count_reset_threshold")]
    pub access_count_reset_threshold: i64,

    /// Copy retrieved secrets to the system clipboard.
    #[serde(default = "default_true")]
    pub clipboard: bool,

    /// Seconds kosh keeps serving a copied secret on Linux, where the
    /// clipboard empties once the owning process exits. `0` hands the
    /// secret over and exits at once.
    #[serde(default = "default_clipboard_timeout_secs")]
    pub clipboard_timeout_secs: u64,

    /// Record operations in `audit.db`.
    #[serde(default = "default_true")]
    pub audit: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    1
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_min_score() -> f64 {
    crate::search::DEFAULT_MIN_SCORE
}

fn default_access_count_reset_threshold() -> i64 {
    1_000
}

fn default_clipboard_timeout_secs() -> u64 {
    45
}

fn default_true() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            min_score: default_min_score(),
            access_count_reset_threshold: default_access_count_reset_threshold(),
            clipboard: true,
            clipboard_timeout_secs: default_clipboard_timeout_secs(),
            audit: true,
        }
    }
}

impl Settings {
    /// Name of the config file inside the data directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<data_dir>/config.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed or holds out-of-range
    /// values, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KoshError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.argon2_params()
            .validate()
            .map_err(|e| KoshError::ConfigError(e.to_string()))?;

        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(KoshError::ConfigError(format!(
                "min_score must be a non-negative number (got {})",
                self.min_score
            )));
        }
        if self.access_count_reset_threshold < 0 {
            return Err(KoshError::ConfigError(format!(
                "access_count_reset_threshold must be 0 or more (got {})",
                self.access_count_reset_threshold
            )));
        }
        Ok(())
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

/// Pick the data directory: explicit flag, then `KOSH_HOME`, then
/// `~/.kosh`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .ok_or_else(|| {
            KoshError::ConfigError(format!(
                "could not determine a home directory; set {HOME_ENV} or pass --data-dir"
            ))
        })
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_iterations, 1);
        assert_eq!(s.argon2_parallelism, 4);
        assert!((s.min_score - 0.2).abs() < f64::EPSILON);
        assert_eq!(s.access_count_reset_threshold, 1_000);
        assert!(s.clipboard);
        assert_eq!(s.clipboard_timeout_secs, 45);
        assert!(s.audit);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
argon2_memory_kib = 131072
argon2_iterations = 3
argon2_parallelism = 2
min_score = 0.5
access_count_reset_threshold = 0
clipboard = false
clipboard_timeout_secs = 10
"#;
        fs::write(tmp.path().join(Settings::FILE_NAME), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_iterations, 3);
        assert_eq!(settings.argon2_parallelism, 2);
        assert!((settings.min_score - 0.5).abs() < f64::EPSILON);
        assert_eq!(settings.access_count_reset_threshold, 0);
        assert!(!settings.clipboard);
        assert_eq!(settings.clipboard_timeout_secs, 10);
        // Rest should be defaults
        assert!(settings.audit);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "not valid {{toml").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(KoshError::ConfigError(_))));
    }

    #[test]
    fn load_rejects_weak_argon2_memory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "argon2_memory_kib = 64\n").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(KoshError::ConfigError(_))));
    }

    #[test]
    fn load_rejects_negative_min_score() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(Settings::FILE_NAME), "min_score = -1.0\n").unwrap();

        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/kosh-explicit"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/kosh-explicit"));
    }

    #[test]
    fn argon2_params_mirror_settings() {
        let s = Settings {
            argon2_memory_kib: 8_192,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            ..Settings::default()
        };
        let p = s.argon2_params();
        assert_eq!(p.memory_kib, 8_192);
        assert_eq!(p.iterations, 2);
        assert_eq!(p.parallelism, 1);
    }
}
