use clap::{Parser, Subcommand};
use std::io::Write;
use std::process;
use subfetch::{
    Config, ProgressEvent, SubfetchError, fetch_subtitles, list_config, remove_config,
    validate_language,
};
use tracing_subscriber::EnvFilter;

/// Frames for the status-line spinner.
const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Parser)]
#[command(
    name = "subfetch",
    version,
    about = "Find and download matching subtitles for the video files in a directory"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download subtitles for the media files in the current directory
    Run {
        /// Override the preferred subtitle language for this run (e.g. "EN")
        #[arg(long)]
        lang: Option<String>,
    },

    /// Inspect or reset the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the stored configuration
    List,
    /// Delete the stored configuration file
    Remove,
}

/// Builds the progress renderer: one status line, updated in place.
fn progress_renderer() -> impl FnMut(ProgressEvent) {
    let mut frame = 0usize;

    move |event| match event {
        ProgressEvent::Started { total } => {
            println!("Searching subtitles for {} file(s)...", total);
        }
        ProgressEvent::Progress {
            success,
            failed,
            total,
        } => {
            let glyph = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
            frame += 1;
            print!(
                "\r\x1b[2K{} {}/{} processed, {} failed",
                glyph,
                success + failed,
                total,
                failed
            );
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::Finished {
            success,
            failed,
            total,
        } => {
            println!(
                "\r\x1b[2K✓ Downloaded {} subtitle(s), {} failed ({} file(s) total)",
                success, failed, total
            );
        }
    }
}

async fn run(cli: Cli) -> Result<(), SubfetchError> {
    match cli.command {
        Command::Config {
            action: ConfigAction::List,
        } => Ok(list_config()?),
        Command::Config {
            action: ConfigAction::Remove,
        } => Ok(remove_config()?),
        Command::Run { lang } => {
            let mut config = Config::load_or_prompt()?;
            if let Some(lang) = lang {
                config.preferred_lang = validate_language(&lang)?;
            }

            let directory = std::env::current_dir()?;
            fetch_subtitles(&directory, &config, progress_renderer()).await?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("subfetch=warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {}
        Err(SubfetchError::Interrupted) => {
            eprintln!("\nInterrupted, aborting without waiting for running downloads");
            process::exit(130);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
