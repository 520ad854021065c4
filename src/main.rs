//! notescribe: transcribe SiYuan audio blocks with an OpenAI-compatible speech-to-text API.

mod app;
mod clipboard;
mod commands;
mod config;
mod host;
mod locator;
mod logging;
mod setup;
mod transcription;

#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
