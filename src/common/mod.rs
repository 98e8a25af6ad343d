//! Common utilities and types shared across rollcoord

pub mod config;
pub mod error;
pub mod utils;

pub use config::RolloverConfig;
pub use error::{Error, Result};
pub use utils::{
    format_duration, format_size, parse_duration, parse_size, timestamp_now_millis,
};
