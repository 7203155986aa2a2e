//! Process configuration, read from the environment.
//!
//! | Variable | Default | |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | listen address |
//! | `PORT` | `8080` | listen port |
//! | `LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `MFKEY_TOOLS_DIR` | `/usr/local/bin` | directory holding `mfkey32`, `mfkey32v2`, `mfkey64` |
//! | `PIPELINE` | `catch,cors,mfkey32,mfkey32v2,mfkey64,not_found` | handler names, in order |
//! | `BODY_LIMIT` | `102400` | largest accepted request body, in bytes |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PIPELINE: &[&str] = &["catch", "cors", "mfkey32", "mfkey32v2", "mfkey64", "not_found"];

/// 100 KiB; a key-recovery request is well under 200 bytes.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HOST `{0}`")]
    InvalidHost(String),

    #[error("invalid PORT `{0}`")]
    InvalidPort(String),

    #[error("invalid BODY_LIMIT `{0}`")]
    InvalidBodyLimit(String),

    #[error("invalid LOG_FORMAT `{0}` (expected `json` or `pretty`)")]
    InvalidLogFormat(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::InvalidLogFormat(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub log_format: LogFormat,
    pub tools_dir: PathBuf,
    pub pipeline: Vec<String>,
    pub body_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = match lookup("HOST") {
            Some(raw) => raw.parse::<IpAddr>().map_err(|_| ConfigError::InvalidHost(raw))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8080,
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Json,
        };
        let tools_dir = lookup("MFKEY_TOOLS_DIR").map_or_else(|| PathBuf::from("/usr/local/bin"), PathBuf::from);
        let pipeline = match lookup("PIPELINE") {
            Some(raw) => raw.split(',').map(|name| name.trim().to_owned()).collect(),
            None => DEFAULT_PIPELINE.iter().map(|name| (*name).to_owned()).collect(),
        };

        let body_limit = match lookup("BODY_LIMIT") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidBodyLimit(raw))?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Self { addr: SocketAddr::new(host, port), log_format, tools_dir, pipeline, body_limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tools_dir, PathBuf::from("/usr/local/bin"));
        assert_eq!(config.pipeline, DEFAULT_PIPELINE);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("LOG_FORMAT", "Pretty"),
            ("MFKEY_TOOLS_DIR", "/opt/proxmark/bin"),
            ("PIPELINE", "catch, not_found"),
            ("BODY_LIMIT", "4096"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.tools_dir, PathBuf::from("/opt/proxmark/bin"));
        assert_eq!(config.pipeline, ["catch", "not_found"]);
        assert_eq!(config.body_limit, 4096);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(config(&[("PORT", "http")]), Err(ConfigError::InvalidPort(p)) if p == "http"));
        assert!(matches!(config(&[("HOST", "localhost")]), Err(ConfigError::InvalidHost(_))));
        assert!(matches!(config(&[("LOG_FORMAT", "xml")]), Err(ConfigError::InvalidLogFormat(_))));
        assert!(matches!(config(&[("BODY_LIMIT", "1mb")]), Err(ConfigError::InvalidBodyLimit(_))));
    }
}
