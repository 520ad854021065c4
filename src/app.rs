//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::commands;
use crate::config::get_config_path;
use crate::logging;
use crate::setup;

/// Transcribe SiYuan audio blocks with an OpenAI-compatible speech-to-text API
#[derive(Parser)]
#[command(name = "notescribe")]
#[command(version)]
#[command(about = "Transcribe SiYuan audio blocks with an OpenAI-compatible speech-to-text API")]
#[command(long_about = "Transcribe SiYuan audio blocks with an OpenAI-compatible speech-to-text API.\n\nThe block command reads an audio block from the running SiYuan kernel, uploads its\naudio to the configured transcription endpoint and inserts the text right after it.\n\nEXAMPLES:\n    # Transcribe an audio block and insert the text after it\n    $ notescribe block 20240101120000-abc1234\n\n    # Transcribe an asset served by the kernel\n    $ notescribe transcribe /assets/memo-20240101.m4a\n\n    # Transcribe a local file and copy the text to the clipboard\n    $ notescribe transcribe --local memo.m4a -c\n\n    # Show which audio a saved block DOM points at\n    $ notescribe locate --dom block.html\n\n    # Set the API key and kernel connection\n    $ notescribe auth")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/notescribe/notescribe.toml\n    Logs:               ~/.local/state/notescribe/notescribe.log.*\n    Environment:        OPENAI_API_KEY, OPENAI_BASE_URL, SIYUAN_URL, SIYUAN_TOKEN"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe an audio block and insert the text after it
    ///
    /// Progress and errors are pushed to the SiYuan UI. The text is also
    /// printed to stdout.
    #[command(visible_alias = "b")]
    Block {
        /// Id of the audio block, e.g. 20240101120000-abc1234
        #[arg(value_name = "BLOCK_ID")]
        block_id: String,

        /// Print the transcription without inserting it into the document
        #[arg(long)]
        no_insert: bool,
    },

    /// Transcribe a single audio reference
    ///
    /// The reference is an asset path served by the kernel, or a file on
    /// disk with --local.
    ///
    /// Examples:
    ///   notescribe transcribe /assets/memo.m4a
    ///   notescribe transcribe --local meeting.wav -o transcript.txt
    #[command(visible_alias = "t")]
    Transcribe {
        /// Asset path (/assets/...) or, with --local, a file path
        #[arg(value_name = "REFERENCE")]
        reference: String,

        /// Read the audio from the local filesystem instead of the kernel
        #[arg(long)]
        local: bool,

        /// Resolve the reference against this directory (implies --local)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Copy transcription to clipboard instead of stdout
        #[arg(short, long)]
        clipboard: bool,

        /// Write transcription to file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Print the audio reference of a block without transcribing
    Locate {
        /// Id of the block to read from the kernel
        #[arg(value_name = "BLOCK_ID", required_unless_present = "dom")]
        block_id: Option<String>,

        /// Read the block DOM from a file instead ("-" for stdin)
        #[arg(long, value_name = "FILE", conflicts_with = "block_id")]
        dom: Option<PathBuf>,
    },

    /// Set the API key, transcription endpoint and SiYuan connection
    #[command(visible_alias = "a")]
    Auth,

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   notescribe completions bash > notescribe.bash
    ///   notescribe completions zsh > _notescribe
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization or first-run setup fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Commands that need neither logging nor config setup
    match &command {
        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "notescribe", &mut io::stdout());
            return Ok(());
        }
        Commands::Logs => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    if setup::ensure_config(&get_config_path()?)? {
        eprintln!("Created default configuration. Run 'notescribe auth' to add your API key.");
    }

    match command {
        Commands::Block {
            block_id,
            no_insert,
        } => commands::handle_block(block_id, no_insert).await?,
        Commands::Transcribe {
            reference,
            local,
            root,
            clipboard,
            output,
        } => commands::handle_transcribe(reference, local, root, clipboard, output).await?,
        Commands::Locate { block_id, dom } => commands::handle_locate(block_id, dom).await?,
        Commands::Auth => {
            if let Err(e) = commands::handle_auth().await {
                // cliclack has already reported the cancellation
                let err_msg = e.to_string();
                if err_msg.contains("cancelled") || err_msg.contains("interrupted") {
                    process::exit(0);
                }
                return Err(e);
            }
        }
        Commands::Config => commands::handle_config()?,
        Commands::Completions { .. } | Commands::Logs => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_block_alias_and_flag() {
        let cli = Cli::try_parse_from(["notescribe", "b", "20240101120000-abc1234", "--no-insert"])
            .unwrap();
        match cli.command {
            Some(Commands::Block {
                block_id,
                no_insert,
            }) => {
                assert_eq!(block_id, "20240101120000-abc1234");
                assert!(no_insert);
            }
            _ => panic!("expected block command"),
        }
    }

    #[test]
    fn test_locate_requires_block_or_dom() {
        assert!(Cli::try_parse_from(["notescribe", "locate"]).is_err());
        assert!(Cli::try_parse_from(["notescribe", "locate", "--dom", "-"]).is_ok());
    }
}
