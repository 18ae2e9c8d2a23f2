use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "teamline.toml",
    "config/teamline.toml",
    "crates/config/teamline.toml",
    "../teamline.toml",
    "../config/teamline.toml",
    "../crates/config/teamline.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

/// Connection settings for the messaging backend.
///
/// ```
/// use teamline_config::ServerConfig;
///
/// let server = ServerConfig::default();
/// assert_eq!(server.ws_url, "ws://127.0.0.1:5001/ws");
/// assert_eq!(server.connect_timeout_seconds, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub ws_url: String,
    #[serde(default = "ServerConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl ServerConfig {
    fn default_ws_url() -> String {
        "ws://127.0.0.1:5001/ws".to_string()
    }

    const fn default_connect_timeout() -> u64 {
        10
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_url: Self::default_ws_url(),
            connect_timeout_seconds: Self::default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "ChatConfig::default_max_message_length")]
    pub max_message_length: usize,
}

impl ChatConfig {
    const fn default_max_message_length() -> usize {
        100_000
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: Self::default_max_message_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Load the client configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use teamline_config::load;
///
/// std::env::remove_var("TEAMLINE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.server.ws_url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let max_message_length =
        i64::try_from(defaults.chat.max_message_length).unwrap_or(i64::MAX);
    let connect_timeout =
        i64::try_from(defaults.server.connect_timeout_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("server.ws_url", defaults.server.ws_url.clone())
        .unwrap()
        .set_default("server.connect_timeout_seconds", connect_timeout)
        .unwrap()
        .set_default("chat.max_message_length", max_message_length)
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("TEAMLINE").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("TEAMLINE_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via TEAMLINE_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded client configuration");
    Ok(config)
}
