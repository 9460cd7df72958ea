//! Settings passed to the media engine when spawning workers and transports.

use crate::media::codecs::MediaKind;
use crate::types::ProducerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// Default lower bound of the worker RTC port range.
pub const DEFAULT_RTC_MIN_PORT: u16 = 10000;

/// Default upper bound of the worker RTC port range.
pub const DEFAULT_RTC_MAX_PORT: u16 = 59999;

/// Default initial outgoing bitrate estimate for new transports (bps).
pub const DEFAULT_INITIAL_OUTGOING_BITRATE: u32 = 1_000_000;

/// Log verbosity of a worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerLogLevel {
    Debug,
    #[default]
    Warn,
    Error,
    None,
}

impl WorkerLogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkerLogLevel::Debug => "debug",
            WorkerLogLevel::Warn => "warn",
            WorkerLogLevel::Error => "error",
            WorkerLogLevel::None => "none",
        }
    }
}

impl fmt::Display for WorkerLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(WorkerLogLevel::Debug),
            "warn" => Ok(WorkerLogLevel::Warn),
            "error" => Ok(WorkerLogLevel::Error),
            "none" => Ok(WorkerLogLevel::None),
            other => Err(format!("unknown worker log level '{other}'")),
        }
    }
}

/// Settings for spawning one worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub log_level: WorkerLogLevel,
    pub rtc_min_port: u16,
    pub rtc_max_port: u16,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            log_level: WorkerLogLevel::default(),
            rtc_min_port: DEFAULT_RTC_MIN_PORT,
            rtc_max_port: DEFAULT_RTC_MAX_PORT,
        }
    }
}

/// Options for creating a WebRTC transport on a room router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRtcTransportOptions {
    /// Local address the transport binds to.
    pub listen_ip: IpAddr,
    /// Public address announced in ICE candidates (for NAT'd hosts).
    pub announced_address: Option<String>,
    pub enable_udp: bool,
    pub enable_tcp: bool,
    pub prefer_udp: bool,
    pub initial_available_outgoing_bitrate: u32,
}

impl Default for WebRtcTransportOptions {
    fn default() -> Self {
        Self {
            listen_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            announced_address: None,
            enable_udp: true,
            enable_tcp: true,
            prefer_udp: true,
            initial_available_outgoing_bitrate: DEFAULT_INITIAL_OUTGOING_BITRATE,
        }
    }
}

/// Options for `MediaTransport::produce`.
///
/// RTP parameters are negotiated between the client and the media engine;
/// this layer carries them without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProduceOptions {
    pub kind: MediaKind,
    pub rtp_parameters: serde_json::Value,
}

/// Options for `MediaTransport::consume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeOptions {
    pub producer_id: ProducerId,
    pub rtp_capabilities: serde_json::Value,
    /// Start the consumer paused until the client signals readiness.
    pub paused: bool,
}
