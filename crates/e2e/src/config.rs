//! Booking API connection settings

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Public restful-booker instance
pub const DEFAULT_BASE_URL: &str = "https://restful-booker.herokuapp.com";

/// Settings file read from the working directory; process env wins over it
pub const ENV_FILE: &str = ".env.test";

/// Settings for talking to the booking API
#[derive(Debug, Clone)]
pub struct BookerConfig {
    pub base_url: String,

    /// Credentials for `POST /auth`
    pub username: String,
    pub password: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Also require checkout not to precede checkin
    pub strict_dates: bool,

    /// Seed for payload generation (None = entropy)
    pub seed: Option<u64>,
}

impl Default for BookerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: "admin".to_string(),
            password: "password123".to_string(),
            timeout: Duration::from_secs(30),
            strict_dates: false,
            seed: None,
        }
    }
}

impl BookerConfig {
    /// Defaults overridden by `BASE_URL`, `AUTH_USERNAME`, `AUTH_PASSWORD`
    /// and `BOOKER_TIMEOUT_SECS`, from [`ENV_FILE`] and then the process
    /// environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_env_file(Path::new(ENV_FILE))
    }

    /// Like [`BookerConfig::from_env`] with an explicit settings file.
    /// A missing file is not an error.
    pub fn from_env_file(path: &Path) -> E2eResult<Self> {
        Self::layered(path, |key| std::env::var(key).ok())
    }

    fn layered(path: &Path, env: impl Fn(&str) -> Option<String>) -> E2eResult<Self> {
        let file = read_env_file(path)?;
        Self::from_lookup(|key| env(key).or_else(|| file.get(key).cloned()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> E2eResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("BASE_URL") {
            config.base_url = url;
        }
        if let Some(username) = lookup("AUTH_USERNAME") {
            config.username = username;
        }
        if let Some(password) = lookup("AUTH_PASSWORD") {
            config.password = password;
        }
        if let Some(secs) = lookup("BOOKER_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                E2eError::Config(format!("BOOKER_TIMEOUT_SECS must be whole seconds, got {:?}", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(E2eError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// `KEY=value` pairs of a dotenv file, empty when the file is absent
pub fn read_env_file(path: &Path) -> E2eResult<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bad = |e: dotenvy::Error| E2eError::Config(format!("{}: {}", path.display(), e));
    dotenvy::from_path_iter(path)
        .map_err(bad)?
        .map(|item| item.map_err(bad))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = BookerConfig::from_lookup(lookup(&[
            ("BASE_URL", "http://localhost:3001/"),
            ("AUTH_USERNAME", "tester"),
            ("BOOKER_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:3001/");
        assert_eq!(config.username, "tester");
        assert_eq!(config.password, "password123");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.url("/booking/1"), "http://localhost:3001/booking/1");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BookerConfig::from_lookup(lookup(&[("BOOKER_TIMEOUT_SECS", "soon")])),
            Err(E2eError::Config(_))
        ));
        assert!(matches!(
            BookerConfig::from_lookup(lookup(&[("BASE_URL", "ftp://example.com")])),
            Err(E2eError::Config(_))
        ));
    }

    #[test]
    fn test_env_file_under_process_env() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(ENV_FILE);
        std::fs::write(
            &path,
            "# booking API\nBASE_URL=http://localhost:3001\nAUTH_USERNAME=tester\nAUTH_PASSWORD=\"s3cret pass\"\n",
        )
        .unwrap();

        let config = BookerConfig::layered(&path, lookup(&[("AUTH_USERNAME", "ci")])).unwrap();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.username, "ci");
        assert_eq!(config.password, "s3cret pass");
    }

    #[test]
    fn test_missing_env_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = BookerConfig::layered(&tmp.path().join(ENV_FILE), lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.username, "admin");
    }
}
