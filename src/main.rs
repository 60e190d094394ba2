use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_api::cli::{Cli, Commands};
use transcript_api::config::Config;
use transcript_api::provider::YoutubeProvider;
use transcript_api::{output, server, utils, TranscriptService};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let mut config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let provider = Arc::new(YoutubeProvider::new(&config.transcripts)?);
            let service = Arc::new(TranscriptService::from_config(provider, &config.transcripts));

            server::serve(&config.server, service).await?;
        }
        Commands::Fetch {
            video,
            lang,
            format,
            output: output_path,
        } => {
            if !lang.is_empty() {
                config.transcripts.preferred_languages = lang;
            }
            config.validate()?;

            let video_id = utils::extract_video_id(&video).unwrap_or_else(|| video.trim().to_string());
            if video_id.is_empty() {
                anyhow::bail!("Missing video ID");
            }

            let provider = Arc::new(YoutubeProvider::new(&config.transcripts)?);
            let service = TranscriptService::from_config(provider, &config.transcripts);

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            progress.enable_steady_tick(Duration::from_millis(100));
            progress.set_message(format!("Fetching transcript for {}...", video_id));

            let result = service.acquire(&video_id).await;
            progress.finish_and_clear();

            match output_path {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }

            if !result.is_success() {
                let status = server::status_code(&result);
                anyhow::bail!("Transcript request failed ({})", status);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            }
            println!(
                "Config file: {}",
                Config::config_path(cli.config.as_deref())?.display()
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "transcript_api=debug,tower_http=debug"
    } else {
        "transcript_api=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
