//! Application configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). CLI flags override them.
//!
//! | Variable                | Default |
//! |-------------------------|---------|
//! | `SWEEPER_PORT`          | 3000    |
//! | `SWEEPER_MAX_UPLOAD_MB` | 50      |
//! | `SWEEPER_PREVIEW_ROWS`  | 5       |

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::transform::DEFAULT_PREVIEW_ROWS;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Maximum request body size, in bytes.
    pub max_upload_bytes: usize,
    /// Rows included in previews.
    pub preview_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_upload_mb: usize =
            parse_var(&lookup, "SWEEPER_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?;

        Ok(Self {
            port: parse_var(&lookup, "SWEEPER_PORT", defaults.port)?,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            preview_rows: parse_var(&lookup, "SWEEPER_PREVIEW_ROWS", defaults.preview_rows)?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SWEEPER_PORT", "8080"),
            ("SWEEPER_MAX_UPLOAD_MB", "2"),
            ("SWEEPER_PREVIEW_ROWS", " 10 "),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn test_invalid_value() {
        let err = AppConfig::from_lookup(lookup(&[("SWEEPER_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("SWEEPER_PORT"));
    }
}
