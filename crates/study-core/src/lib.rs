//! Study Core - Shared functionality for the study timer
//!
//! Standard locations, the user configuration file, and the duration
//! formatting used by every display surface.

pub mod config;
pub mod format;
pub mod paths;

pub use config::Config;
pub use paths::Paths;
