//! Router codec table.
//!
//! Every room router is created with the same capability list: Opus for audio,
//! VP8 and H264 for video. Parameters are passed through to the media engine
//! verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Returns the kind as a string for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Value of a codec format parameter (`fmtp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodecParameterValue {
    Number(u32),
    Text(String),
}

/// One entry of the router codec table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpCodecCapability {
    pub kind: MediaKind,
    /// MIME type, e.g. `audio/opus`.
    pub mime_type: String,
    pub clock_rate: u32,
    /// Audio channel count; `None` for video codecs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(default)]
    pub parameters: BTreeMap<String, CodecParameterValue>,
}

/// Opus clock rate in Hz.
pub const OPUS_CLOCK_RATE: u32 = 48_000;

/// RTP video clock rate in Hz.
pub const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Build the default codec table used for every room router.
#[must_use]
pub fn default_media_codecs() -> Vec<RtpCodecCapability> {
    vec![
        RtpCodecCapability {
            kind: MediaKind::Audio,
            mime_type: "audio/opus".to_string(),
            clock_rate: OPUS_CLOCK_RATE,
            channels: Some(2),
            parameters: BTreeMap::new(),
        },
        RtpCodecCapability {
            kind: MediaKind::Video,
            mime_type: "video/VP8".to_string(),
            clock_rate: VIDEO_CLOCK_RATE,
            channels: None,
            parameters: BTreeMap::new(),
        },
        RtpCodecCapability {
            kind: MediaKind::Video,
            mime_type: "video/H264".to_string(),
            clock_rate: VIDEO_CLOCK_RATE,
            channels: None,
            parameters: BTreeMap::from([
                (
                    "packetization-mode".to_string(),
                    CodecParameterValue::Number(1),
                ),
                (
                    "profile-level-id".to_string(),
                    CodecParameterValue::Text("42e01f".to_string()),
                ),
                (
                    "level-asymmetry-allowed".to_string(),
                    CodecParameterValue::Number(1),
                ),
            ]),
        },
    ]
}
