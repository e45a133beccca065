use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_SESSION_TTL: &str = "12h";
pub const DEFAULT_PROVINCE: &str = "hubei";
pub const DEFAULT_SUBJECT: &str = "physics";

/// Service configuration.
///
/// Example YAML:
/// ```yaml
/// port: 8000
/// backend_url: "http://localhost:8080"
/// data_dir: "data"
/// session_ttl: "12h"
/// request_timeout: "30s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the recommendation backend that proxy routes forward to
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Directory holding the ranking_score_<province>_<subject>.json files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User credential file. Defaults to users.json in the config directory.
    #[serde(default)]
    pub users_path: Option<PathBuf>,

    /// Session lifetime, humantime format ("12h", "30m")
    #[serde(default = "default_session_ttl")]
    pub session_ttl: String,

    /// Per-request timeout for backend calls; none when unset
    #[serde(default)]
    pub request_timeout: Option<String>,

    #[serde(default = "default_province")]
    pub default_province: String,

    #[serde(default = "default_subject")]
    pub default_subject: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            users_path: None,
            session_ttl: DEFAULT_SESSION_TTL.to_string(),
            request_timeout: None,
            default_province: DEFAULT_PROVINCE.to_string(),
            default_subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_session_ttl() -> String {
    DEFAULT_SESSION_TTL.to_string()
}

fn default_province() -> String {
    DEFAULT_PROVINCE.to_string()
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}
