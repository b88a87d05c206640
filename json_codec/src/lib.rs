#![doc = include_str!("../../README.md")]

pub mod codec;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod traits;
pub mod validate;
pub mod value;

pub use codec::Codec;
pub use config::Configuration;
pub use error::Error;
pub use json_codec_macros::JsonCodec;
pub use registry::CodecRegistry;
pub use traits::{JsonCodec, Record};

// Re-exported so that derived code and callers agree on versions.
pub use chrono;
pub use serde_json;
pub use uuid;
