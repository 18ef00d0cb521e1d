use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub espeak_bin: String,
    pub skip_health_check: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("PORT must be a number, got '{}'", raw)))?,
            None => 3000,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            models_dir: lookup("MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./models")),
            staging_dir: lookup("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            espeak_bin: lookup("ESPEAK_BIN").unwrap_or_else(|| "espeak-ng".to_string()),
            skip_health_check: lookup("SKIP_HEALTH_CHECK")
                .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid address {}:{}", self.host, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.models_dir, PathBuf::from("./models"));
        assert_eq!(config.staging_dir, std::env::temp_dir());
        assert_eq!(config.espeak_bin, "espeak-ng");
        assert!(!config.skip_health_check);
        assert_eq!(config.addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("MODELS_DIR", "/opt/models"),
            ("STAGING_DIR", "/var/tmp/tts"),
            ("ESPEAK_BIN", "/usr/local/bin/espeak-ng"),
            ("SKIP_HEALTH_CHECK", "true"),
        ])
        .unwrap();

        assert_eq!(config.addr().unwrap(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.models_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.staging_dir, PathBuf::from("/var/tmp/tts"));
        assert_eq!(config.espeak_bin, "/usr/local/bin/espeak-ng");
        assert!(config.skip_health_check);
    }

    #[test]
    fn test_bad_port_names_variable() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("PORT")));
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let config = config(&[("HOST", "not a host")]).unwrap();
        assert!(config.addr().is_err());
    }
}
