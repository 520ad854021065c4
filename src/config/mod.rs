//! Configuration management for notescribe.
//!
//! Loads and saves the TOML configuration holding the transcription API credentials and
//! the SiYuan kernel connection. The file is written with owner-only permissions since
//! it stores secrets.

pub mod file;

pub use file::{get_config_path, NotescribeConfig};
