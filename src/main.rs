//! Application entry point: Shadow Practice.
//!
//! # Usage
//!
//! ```text
//! shadow-practice <file>         # pdf, image or text file
//! shadow-practice --text "..."   # pasted text
//! shadow-practice -              # text read from stdin
//! shadow-practice --help
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Read the practice material named on the command line.
//! 4. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 5. Build the [`GeminiClient`] from config.
//! 6. Ingest the material into a titled sentence list.  A failure here ends
//!    the program before any audio device is touched.
//! 7. Run [`eframe::run_native`]. It blocks the main thread until the window
//!    is closed.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use eframe::egui;
use shadow_practice::{
    app::ShadowingApp,
    config::AppConfig,
    services::{ContentIngestor, ContentSource, GeminiClient},
    session::{SessionError, SessionServices},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "shadow-practice", version)]
#[command(about = "Listen, repeat and get a pronunciation score, one sentence at a time")]
struct Cli {
    /// Practice text given directly instead of a file.
    #[arg(short, long, conflicts_with = "path")]
    text: Option<String>,

    /// PDF, image or text file to practise; `-` reads text from stdin.
    #[arg(required_unless_present = "text")]
    path: Option<PathBuf>,
}

impl Cli {
    /// The material to ingest.
    fn source(&self) -> Result<ContentSource> {
        let source = match (&self.text, &self.path) {
            (Some(text), _) => ContentSource::Text(text.clone()),
            (None, Some(path)) if path.as_os_str() == "-" => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read stdin")?;
                ContentSource::Text(text)
            }
            (None, Some(path)) => ContentSource::from_path(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (None, None) => bail!("no practice material given"),
        };

        if source.is_empty() {
            bail!("the practice material is empty");
        }
        Ok(source)
    }
}

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Shadow Practice")
        .with_inner_size([width, height])
        .with_min_inner_size([640.0, 420.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Shadow Practice starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Practice material
    let cli = Cli::parse();
    let source = match cli.source() {
        Ok(source) => source,
        Err(e) => {
            log::error!("{e:#}");
            std::process::exit(2);
        }
    };

    // 4. Tokio runtime (2 worker threads, remote calls only)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 5. Remote collaborators
    let client = Arc::new(GeminiClient::from_config(&config));

    // 6. Ingestion
    let content = match rt.block_on(client.process(&source)) {
        Ok(content) => content,
        Err(e) => {
            log::error!("{}", SessionError::ContentProcessingFailure(e.to_string()));
            std::process::exit(1);
        }
    };

    // 7. Build the egui app and run it (blocks until the window is closed)
    let services = SessionServices {
        synthesizer: client.clone(),
        scorer: client.clone(),
    };
    let app = match ShadowingApp::new(
        content,
        services,
        client,
        config.audio.clone(),
        rt.handle().clone(),
    ) {
        Ok(app) => app,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    eframe::run_native(
        "Shadow Practice",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("shadow-practice").chain(args.iter().copied()))
    }

    #[test]
    fn text_flag_becomes_text_source() {
        let cli = parse(&["--text", "Good morning."]).unwrap();
        match cli.source().unwrap() {
            ContentSource::Text(text) => assert_eq!(text, "Good morning."),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn path_argument_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Where is the station?").unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let cli = parse(&[path.as_str()]).unwrap();
        match cli.source().unwrap() {
            ContentSource::Text(text) => assert!(text.contains("station")),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn missing_arguments_are_a_usage_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn help_is_not_read_as_a_path() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn text_flag_without_value_is_a_usage_error() {
        let err = parse(&["--text"]).unwrap_err();
        assert_ne!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("--text"));
    }

    #[test]
    fn text_and_path_conflict() {
        let err = parse(&["--text", "Hi", "notes.txt"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn blank_text_is_rejected() {
        let cli = parse(&["--text", "   "]).unwrap();
        assert!(cli.source().is_err());
    }

    #[test]
    fn dash_is_accepted_as_stdin() {
        let cli = parse(&["-"]).unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("-")));
        assert!(cli.text.is_none());
    }
}
