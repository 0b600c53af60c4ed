//! Application configuration.
//!
//! Precedence: defaults < file < environment. The file is the explicit path if given,
//! else `DEVCAMPER_CONFIG`, else `./devcamper.toml` when present.

use crate::errors::ApiError;
use crate::query::{DEFAULT_LIMIT, MAX_LIMIT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Deadline for list queries; none by default.
    pub query_timeout_ms: Option<u64>,
    pub token_expire_days: u32,
    /// PKCS#8 PEM for token signing; a per-process key is generated when absent.
    pub token_key_pem: Option<String>,
    pub reset_token_minutes: u32,
    pub mail_from_name: String,
    pub mail_from_email: String,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    /// Offline geocoder table: zipcode to `[lng, lat]`.
    pub zipcodes: HashMap<String, [f64; 2]>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            query_timeout_ms: None,
            token_expire_days: 30,
            token_key_pem: None,
            reset_token_minutes: 10,
            mail_from_name: "DevCamper".into(),
            mail_from_email: "noreply@devcamper.io".into(),
            log_dir: None,
            log_level: None,
            zipcodes: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// # Errors
    /// `Io` if the file cannot be read, `Toml` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let s = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&s)?)
    }

    /// Loads defaults, then the config file, then environment overrides.
    ///
    /// # Errors
    /// An explicitly named file that is missing or malformed, or a malformed
    /// environment value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApiError> {
        let env_path = std::env::var_os("DEVCAMPER_CONFIG").map(PathBuf::from);
        let mut cfg = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => {
                let local = PathBuf::from("devcamper.toml");
                if local.is_file() { Self::from_file(&local)? } else { Self::default() }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `DEVCAMPER_*` overrides read through `get`.
    ///
    /// # Errors
    /// `Config` when a numeric variable does not parse or the key file cannot be read.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<(), ApiError> {
        fn num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ApiError> {
            raw.trim().parse().map_err(|_| ApiError::Config(format!("{key}: invalid number \"{raw}\"")))
        }
        if let Some(v) = get("DEVCAMPER_DEFAULT_LIMIT") {
            self.default_limit = num("DEVCAMPER_DEFAULT_LIMIT", &v)?;
        }
        if let Some(v) = get("DEVCAMPER_MAX_LIMIT") {
            self.max_limit = num("DEVCAMPER_MAX_LIMIT", &v)?;
        }
        if let Some(v) = get("DEVCAMPER_QUERY_TIMEOUT_MS") {
            self.query_timeout_ms = Some(num("DEVCAMPER_QUERY_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = get("DEVCAMPER_TOKEN_EXPIRE_DAYS") {
            self.token_expire_days = num("DEVCAMPER_TOKEN_EXPIRE_DAYS", &v)?;
        }
        if let Some(p) = get("DEVCAMPER_TOKEN_KEY_FILE") {
            let pem = std::fs::read_to_string(&p)
                .map_err(|e| ApiError::Config(format!("DEVCAMPER_TOKEN_KEY_FILE {p}: {e}")))?;
            self.token_key_pem = Some(pem);
        }
        Ok(())
    }

    /// # Errors
    /// `Config` for zero limits.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(ApiError::Config("default_limit and max_limit must be positive".into()));
        }
        if self.max_limit > MAX_LIMIT {
            log::warn!("max_limit {} exceeds the hard cap {MAX_LIMIT}; capping", self.max_limit);
        }
        Ok(())
    }

    #[must_use]
    pub fn query_timeout(&self) -> Option<std::time::Duration> {
        self.query_timeout_ms.map(std::time::Duration::from_millis)
    }
}
