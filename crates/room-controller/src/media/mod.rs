//! Media engine contract and the settings this layer passes through it.

pub mod codecs;
pub mod engine;
pub mod settings;

pub use codecs::{default_media_codecs, CodecParameterValue, MediaKind, RtpCodecCapability};
pub use engine::{
    MediaConsumer, MediaEngine, MediaError, MediaProducer, MediaRouter, MediaTransport,
    MediaWorker,
};
pub use settings::{
    ConsumeOptions, ProduceOptions, WebRtcTransportOptions, WorkerLogLevel, WorkerSettings,
};
