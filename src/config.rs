//! Configuration for the tasking client
//!
//! `ClientConfig` is what the library consumes. The CLI fills it from
//! command-line flags with environment fallbacks (`ConnectionArgs`).

use crate::context::RequestContext;
use crate::error::{ClientError, Result};

/// Default API root of a local Tasking Manager backend
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v2/";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every relative resource path is joined to
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Session token sent as `Authorization: Token <token>`
    pub token: Option<String>,
    /// Preferred locale sent as `Accept-Language`
    pub locale: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            token: None,
            locale: None,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TM_API_URL") {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("TM_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("TM_TOKEN") {
            if !val.is_empty() {
                config.token = Some(val);
            }
        }

        if let Ok(val) = std::env::var("TM_LOCALE") {
            if !val.is_empty() {
                config.locale = Some(val);
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ClientError::Config("base URL must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must use http or https: {}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    /// Request context carrying this config's token and locale
    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            token: self.token.clone(),
            locale: self.locale.clone(),
        }
    }
}

/// Connection flags shared by every CLI subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API root URL
    #[arg(long, env = "TM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "TM_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Session token
    #[arg(long, env = "TM_TOKEN")]
    pub token: Option<String>,

    /// Preferred locale (e.g. "en", "pt-BR")
    #[arg(long, env = "TM_LOCALE")]
    pub locale: Option<String>,

    /// Log level of the CLI (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl From<ConnectionArgs> for ClientConfig {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            base_url: args.api_url,
            timeout_secs: args.timeout_secs,
            token: args.token.filter(|t| !t.is_empty()),
            locale: args.locale.filter(|l| !l.is_empty()),
        }
    }
}
