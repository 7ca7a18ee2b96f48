/*
newscast - command-line entry point.
Loads configuration, builds the briefing pipeline and writes the narrated audio to disk.
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newscast::bootstrap::build_briefing;
use newscast::briefing::BriefingRequest;
use newscast::sources::SourceSelection;

#[derive(Parser, Debug)]
#[command(name = "newscast", about = "Spoken news briefings aggregated from news, forums and social media")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one briefing and save its audio
    Brief {
        /// Topic to cover; repeat for up to three topics
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,

        /// news, forum, social, both or all
        #[arg(long, default_value = "all")]
        sources: SourceSelection,

        /// Target language of the script and voice
        #[arg(long, default_value = "en-US")]
        language: String,

        /// Audio output path (defaults to audio/tts_<timestamp>.mp3)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write the script text here
        #[arg(long, value_name = "FILE")]
        script_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) => {
            if !p.exists() {
                error!(path = ?p, "specified config file not found");
                anyhow::bail!("Config file not found: {}", p.display());
            }
            Some(p)
        }
        None => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
    };

    let config = Config::load_with_defaults(
        Some(default_path.as_path()).filter(|p| p.exists()),
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    match args.command {
        Command::Brief {
            topics,
            sources,
            language,
            output,
            script_out,
        } => {
            let request = BriefingRequest::new(topics, sources).with_language(language);
            run_brief(&config, request, output, script_out).await
        }
    }
}

async fn run_brief(
    config: &Config,
    request: BriefingRequest,
    output: Option<PathBuf>,
    script_out: Option<PathBuf>,
) -> Result<()> {
    let briefing = build_briefing(config).context("failed to initialize pipeline")?;

    let response = tokio::select! {
        res = briefing.generate(&request) => res.context("briefing generation failed")?,
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, abandoning briefing");
            anyhow::bail!("interrupted");
        }
    };

    let output = output.unwrap_or_else(|| {
        PathBuf::from("audio").join(format!("tts_{}.mp3", Local::now().format("%Y%m%d_%H%M%S")))
    });
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&output, &response.audio)
        .await
        .with_context(|| format!("failed to write audio to {}", output.display()))?;
    info!(path = %output.display(), bytes = response.audio.len(), "audio saved");

    if let Some(path) = script_out {
        tokio::fs::write(&path, &response.script_text)
            .await
            .with_context(|| format!("failed to write script to {}", path.display()))?;
        info!(path = %path.display(), "script saved");
    }

    let summary = serde_json::json!({
        "audio_file": output.display().to_string(),
        "script_text": response.script_text,
        "metadata": response.metadata,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
