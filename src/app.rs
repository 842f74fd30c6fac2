//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal-based voice recorder with real-time waveform visualization
#[derive(Parser)]
#[command(name = "vrec")]
#[command(version)]
#[command(about = "A terminal-based voice recorder with real-time waveform visualization")]
#[command(
    long_about = "A terminal-based voice recorder with real-time waveform visualization.\n\nRecord takes from the microphone, browse and play them back, rename and\ndelete them, and export them to MP3 via ffmpeg.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Record a new take\n    $ vrec\n    $ vrec record\n\n    # Browse saved takes (play, rename, delete)\n    $ vrec takes\n\n    # Play a take by name\n    $ vrec play take1\n\n    # Export a take to MP3\n    $ vrec export take1 -o song.mp3\n\n    # Edit configuration file\n    $ vrec config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vrec/vrec.toml\n    Takes:              ~/.local/share/vrec/\n    Logs:               ~/.local/state/vrec/vrec.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record audio with real-time visualization (default)
    ///
    /// Press Enter to save the take, 'd' to export it straight to MP3,
    /// Space to pause/resume, Escape/q to cancel.
    #[command(visible_alias = "r")]
    Record,

    /// Browse saved takes interactively
    ///
    /// Use arrow keys to navigate, Enter to play/stop, 'r' to rename,
    /// 'x' to delete, Esc/q to exit.
    #[command(visible_alias = "t")]
    Takes,

    /// List saved takes
    #[command(visible_alias = "l")]
    List,

    /// Play a saved take through the system audio player
    Play {
        /// Take name to play
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Rename a saved take
    Rename {
        /// Current take name
        #[arg(value_name = "OLD")]
        old_name: String,

        /// New take name
        #[arg(value_name = "NEW")]
        new_name: String,
    },

    /// Delete a saved take and its audio file
    Delete {
        /// Take name to delete
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Export a saved take to MP3 via ffmpeg
    ///
    /// Examples:
    ///   vrec export take1
    ///   vrec export take1 -o song.mp3
    #[command(visible_alias = "e")]
    Export {
        /// Take name to export
        #[arg(value_name = "NAME")]
        name: String,

        /// Output file (defaults to recording.mp3)
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio device, sample rate, and export settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in vrec.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   vrec completions bash > vrec.bash
    ///   vrec completions zsh > _vrec
    ///   vrec completions fish > vrec.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails (e.g., recording, playback, export)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vrec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record().await?;
        }
        Some(Commands::Takes) => {
            commands::handle_takes().await?;
        }
        Some(Commands::List) => {
            commands::handle_list()?;
        }
        Some(Commands::Play { name }) => {
            commands::handle_play(name).await?;
        }
        Some(Commands::Rename { old_name, new_name }) => {
            commands::handle_rename(old_name, new_name)?;
        }
        Some(Commands::Delete { name }) => {
            commands::handle_delete(name)?;
        }
        Some(Commands::Export { name, output }) => {
            commands::handle_export(name, output)?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
