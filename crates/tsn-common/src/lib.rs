#![doc = "Common types shared across the igc-tsn workspace."]

pub mod config;
pub mod error;
pub mod flags;
pub mod metrics;
pub mod time;

pub use config::*;
pub use error::*;
pub use flags::*;
pub use metrics::*;
pub use time::*;
