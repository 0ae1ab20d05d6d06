//! Command-line / environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::pin::Pin;

#[derive(Parser, Debug)]
#[command(name = "notepad-server")]
#[command(about = "PIN-protected notepad server")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "BIND_ADDRESS")]
    pub bind: String,

    /// Directory holding notepads.json and the note files
    #[arg(long, default_value = "data", env = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Shared PIN (4-10 digits). Leave unset to disable protection.
    #[arg(long, env = "NOTEPAD_PIN", hide_env_values = true)]
    pub pin: Option<String>,

    /// Title shown by clients
    #[arg(long, default_value = "Notepad", env = "SITE_TITLE")]
    pub site_title: String,

    /// Public base URL of the site
    #[arg(long, default_value = "http://localhost:3000", env = "BASE_URL")]
    pub base_url: String,

    /// Failed PIN attempts allowed before a client is locked out
    #[arg(long, default_value_t = 5, env = "MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Lockout duration in minutes
    #[arg(long, default_value_t = 15, env = "LOCKOUT_MINUTES")]
    pub lockout_minutes: u64,

    /// Identify clients by the first X-Forwarded-For entry (only behind a trusted proxy)
    #[arg(long, default_value_t = false, env = "TRUST_PROXY")]
    pub trust_proxy: bool,
}

/// Runtime configuration shared by all handlers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub pin: Option<Pin>,
    pub site_title: String,
    pub base_url: String,
    pub max_attempts: u32,
    pub lockout: Duration,
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            pin: None,
            site_title: "Notepad".to_string(),
            base_url: "http://localhost:3000".to_string(),
            max_attempts: 5,
            lockout: Duration::from_secs(15 * 60),
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let pin = cli.pin.as_deref().and_then(Pin::new);
        match &pin {
            Some(pin) if !pin.is_active() => {
                tracing::warn!("Configured PIN is not 4-10 digits; PIN protection is disabled");
            }
            Some(_) => tracing::info!("PIN protection is enabled"),
            None => tracing::info!("No PIN configured; PIN protection is disabled"),
        }

        Self {
            data_dir: cli.data_dir.clone(),
            pin,
            site_title: cli.site_title.clone(),
            base_url: normalize_base_url(&cli.base_url),
            max_attempts: cli.max_attempts,
            lockout: Duration::from_secs(cli.lockout_minutes.saturating_mul(60)),
            trust_proxy: cli.trust_proxy,
        }
    }

    /// The PIN that requests must present, if protection is active.
    pub fn active_pin(&self) -> Option<&Pin> {
        self.pin.as_ref().filter(|pin| pin.is_active())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
