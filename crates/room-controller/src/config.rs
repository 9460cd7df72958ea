//! Room Controller configuration.
//!
//! Configuration is loaded from environment variables. The codec table is not
//! configurable; see [`crate::media::default_media_codecs`].

use crate::media::settings::{DEFAULT_RTC_MAX_PORT, DEFAULT_RTC_MIN_PORT};
use crate::media::{
    default_media_codecs, RtpCodecCapability, WebRtcTransportOptions, WorkerLogLevel,
    WorkerSettings,
};
use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default delay before a replacement worker is spawned.
pub const DEFAULT_WORKER_REPLACEMENT_BACKOFF_MS: u64 = 2000;

/// Default number of chat messages retained per room.
pub const DEFAULT_CHAT_HISTORY_LIMIT: usize = 100;

/// Default controller instance ID prefix.
pub const DEFAULT_RC_ID_PREFIX: &str = "rc";

/// Room Controller configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this controller instance (log correlation).
    pub rc_id: String,

    /// Number of media workers to spawn at startup.
    pub worker_count: usize,

    /// Lower bound of the RTC port range handed to each worker.
    pub rtc_min_port: u16,

    /// Upper bound of the RTC port range handed to each worker.
    pub rtc_max_port: u16,

    /// Worker process log verbosity.
    pub worker_log_level: WorkerLogLevel,

    /// Address transports bind to.
    pub listen_ip: IpAddr,

    /// Public address announced in ICE candidates, if behind NAT.
    pub announced_address: Option<String>,

    /// Delay before spawning a replacement for a dead worker.
    pub worker_replacement_backoff: Duration,

    /// Maximum chat messages retained per room.
    pub chat_history_limit: usize,

    /// Router codec table.
    pub media_codecs: Vec<RtpCodecCapability>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let worker_count = match vars.get("RC_WORKER_COUNT") {
            Some(raw) => parse_var::<usize>("RC_WORKER_COUNT", raw)?,
            None => std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        };
        if worker_count == 0 {
            return Err(ConfigError::InvalidValue(
                "RC_WORKER_COUNT must be at least 1".to_string(),
            ));
        }

        let rtc_min_port = optional_var(vars, "RC_RTC_MIN_PORT")?.unwrap_or(DEFAULT_RTC_MIN_PORT);
        let rtc_max_port = optional_var(vars, "RC_RTC_MAX_PORT")?.unwrap_or(DEFAULT_RTC_MAX_PORT);
        if rtc_min_port > rtc_max_port {
            return Err(ConfigError::InvalidValue(format!(
                "RC_RTC_MIN_PORT ({rtc_min_port}) must not exceed RC_RTC_MAX_PORT ({rtc_max_port})"
            )));
        }

        let worker_log_level = match vars.get("RC_WORKER_LOG_LEVEL") {
            Some(raw) => raw
                .parse::<WorkerLogLevel>()
                .map_err(|e| ConfigError::InvalidValue(format!("RC_WORKER_LOG_LEVEL: {e}")))?,
            None => WorkerLogLevel::default(),
        };

        let listen_ip = optional_var(vars, "RC_LISTEN_IP")?
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let announced_address = vars
            .get("RC_ANNOUNCED_ADDRESS")
            .filter(|s| !s.trim().is_empty())
            .cloned();

        let backoff_ms = optional_var(vars, "RC_WORKER_REPLACEMENT_BACKOFF_MS")?
            .unwrap_or(DEFAULT_WORKER_REPLACEMENT_BACKOFF_MS);

        let chat_history_limit =
            optional_var(vars, "RC_CHAT_HISTORY_LIMIT")?.unwrap_or(DEFAULT_CHAT_HISTORY_LIMIT);

        // Generate controller instance ID
        let rc_id = vars.get("RC_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_RC_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            rc_id,
            worker_count,
            rtc_min_port,
            rtc_max_port,
            worker_log_level,
            listen_ip,
            announced_address,
            worker_replacement_backoff: Duration::from_millis(backoff_ms),
            chat_history_limit,
            media_codecs: default_media_codecs(),
        })
    }

    /// Settings used for every worker spawn, including replacements.
    #[must_use]
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            log_level: self.worker_log_level,
            rtc_min_port: self.rtc_min_port,
            rtc_max_port: self.rtc_max_port,
        }
    }

    /// Transport options the signaling layer passes to `create_webrtc_transport`.
    #[must_use]
    pub fn transport_options(&self) -> WebRtcTransportOptions {
        WebRtcTransportOptions {
            listen_ip: self.listen_ip,
            announced_address: self.announced_address.clone(),
            ..WebRtcTransportOptions::default()
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{name}: '{raw}'")))
}

fn optional_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(name).map(|raw| parse_var(name, raw)).transpose()
}
