use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// How bearer keys on protected routes are checked.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Ask the model provider whether it accepts the key.
    #[default]
    Provider,
    /// Accept any non-empty key.
    Presence,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_graph_service_url")]
    pub graph_service_url: String,
    #[serde(default)]
    pub graph_service_api_key: Option<String>,
    #[serde(default = "default_graph_dataset")]
    pub graph_dataset: String,
    #[serde(default = "default_graph_request_timeout_secs")]
    pub graph_request_timeout_secs: u64,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub initialize_on_startup: bool,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            corpus_path: default_corpus_path(),
            static_dir: default_static_dir(),
            service_name: default_service_name(),
            graph_service_url: default_graph_service_url(),
            graph_service_api_key: None,
            graph_dataset: default_graph_dataset(),
            graph_request_timeout_secs: default_graph_request_timeout_secs(),
            auth_mode: AuthMode::default(),
            openai_base_url: default_base_url(),
            initialize_on_startup: false,
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

const fn default_http_port() -> u16 {
    8080
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/combined_harry_potter.txt")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client")
}

fn default_service_name() -> String {
    "Harry Potter Q&A Service".to_string()
}

fn default_graph_service_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_graph_dataset() -> String {
    "harry_potter".to_string()
}

const fn default_graph_request_timeout_secs() -> u64 {
    30 * 60
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_shutdown_grace_secs() -> u64 {
    10
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
