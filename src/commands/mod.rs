//! Application command handlers for notescribe.
//!
//! # Commands
//! - `block`: Transcribe a SiYuan audio block and insert the text after it
//! - `transcribe`: Transcribe a single asset path or local audio file
//! - `locate`: Print the audio reference a block resolves to
//! - `auth`: API key, endpoint and kernel connection setup
//! - `config`: Open configuration file in user's preferred editor
//! - `logs`: Display recent log entries

pub mod auth;
pub mod block;
pub mod config;
pub mod locate;
pub mod logs;
pub mod transcribe;

pub use auth::handle_auth;
pub use block::handle_block;
pub use config::handle_config;
pub use locate::handle_locate;
pub use logs::handle_logs;
pub use transcribe::handle_transcribe;
