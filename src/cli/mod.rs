use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript-api",
    about = "Transcript API - Serve plain-text YouTube transcripts over HTTP",
    version,
    long_about = "A small HTTP service that fetches YouTube transcripts, preferring configured languages and falling back to auto-generated captions, with bounded retries on transient failures."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./config.yaml or the user config directory)
    #[arg(short, long, global = true, env = "TRANSCRIPT_API_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long, env = "TRANSCRIPT_API_HOST")]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long, env = "TRANSCRIPT_API_PORT")]
        port: Option<u16>,
    },

    /// Fetch one transcript and print it
    Fetch {
        /// Video ID or YouTube URL
        #[arg(value_name = "VIDEO_ID_OR_URL")]
        video: String,

        /// Preferred language codes in order (overrides config)
        #[arg(short, long, value_name = "LANG", value_delimiter = ',')]
        lang: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// Same JSON body the HTTP endpoint returns
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_languages_split_on_commas() {
        let cli = Cli::parse_from(["transcript-api", "fetch", "dQw4w9WgXcQ", "--lang", "fr,en"]);
        match cli.command {
            Commands::Fetch { video, lang, format, .. } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(lang, vec!["fr", "en"]);
                assert_eq!(format.to_string(), "text");
            }
            _ => panic!("expected fetch command"),
        }
    }
}
