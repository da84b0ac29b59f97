//! autocut: AI highlight cut of a local video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use autocut_analysis::GeminiClient;
use autocut_media::{check_ffmpeg, check_ffprobe, ClipAssembler};
use autocut_models::{EditRequest, PipelineEvent};
use autocut_pipeline::{PipelineConfig, PipelineError, PipelineOrchestrator};

#[derive(Parser)]
#[command(name = "autocut")]
#[command(about = "Cut a shorter highlight video chosen by Gemini from a local source video")]
struct Cli {
    /// Source video
    source: PathBuf,

    /// Editing instructions (blank picks the most exciting, most stable shots)
    #[arg(short, long, default_value = "")]
    instructions: String,

    /// Target output length in seconds (at least 10)
    #[arg(short, long)]
    target: f64,

    /// Output file name (".mp4" is appended when missing)
    #[arg(short, long, default_value = "")]
    output: String,

    /// Directory for the finished video (overrides AUTOCUT_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autocut=info,warn"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Report a failed run the same way for setup and pipeline errors.
fn exit_with(err: &PipelineError) -> ! {
    error!("Run failed: {}", err);
    eprintln!("\nError: {}", err.user_message());
    std::process::exit(1);
}

/// Print events until the run drops its sender.
async fn print_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    let mut last_percent = None;
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::Log { message, .. } => println!("{}", message),
            PipelineEvent::Progress(state) => {
                let percent = state.percent();
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    print!("\r  {} {:>3}%", state.phase, percent);
                    if percent == 100 {
                        println!();
                    }
                    let _ = std::io::stdout().flush();
                }
            }
            PipelineEvent::Stage { .. } | PipelineEvent::Done { .. } | PipelineEvent::Error { .. } => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS); already installed is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    info!("Pipeline config: {:?}", config);

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    // A missing key is the same credential precondition the orchestrator checks
    let gemini = match GeminiClient::from_env() {
        Ok(client) => client,
        Err(e) => exit_with(&PipelineError::from(e)),
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling run");
            let _ = cancel_tx.send(true);
        }
    });

    let renderer = ClipAssembler::new(config.encoding.clone())
        .with_timeout(config.render_timeout.as_secs())
        .with_cancel(cancel_rx.clone());
    let orchestrator = PipelineOrchestrator::new(Arc::new(gemini), Arc::new(renderer), config)
        .with_cancel(cancel_rx);

    let (tx, rx) = orchestrator.event_channel();
    let printer = tokio::spawn(print_events(rx));

    let request = EditRequest::new(cli.source, cli.instructions, cli.target, cli.output);
    let result = orchestrator.run(request, tx).await;
    printer.await.ok();

    match result {
        Ok(outcome) => {
            println!(
                "\nSaved {} ({:.1}s, model {})",
                outcome.output_path.display(),
                outcome.duration,
                outcome.model
            );
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}
