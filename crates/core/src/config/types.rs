use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::library::SourceSelector;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("games.db")
}

/// Outgoing HTTP settings shared by both fetchers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("gamelist/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_hltb")]
    pub hltb: SourceConfig,
    #[serde(default = "default_completionator")]
    pub completionator: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            hltb: default_hltb(),
            completionator: default_completionator(),
        }
    }
}

/// One scraped site
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub base_url: String,
    pub search_path: String,
}

fn default_enabled() -> bool {
    true
}

pub(crate) fn default_hltb() -> SourceConfig {
    SourceConfig {
        enabled: true,
        base_url: "https://howlongtobeat.com".to_string(),
        search_path: "/api/search".to_string(),
    }
}

pub(crate) fn default_completionator() -> SourceConfig {
    SourceConfig {
        enabled: true,
        base_url: "https://completionator.com".to_string(),
        search_path: "/Game/Search".to_string(),
    }
}

/// Library behavior
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Sources consulted when a request does not name one
    #[serde(default)]
    pub default_source: SourceSelector,
}
