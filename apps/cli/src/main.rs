use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vidlens_core::ClientConfig;

use crate::commands::App;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "vidlens")]
#[command(about = "Process videos, then chat with, search, summarize and clip them")]
struct Cli {
    /// Backend base URL, e.g. "http://localhost:8000/api"
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the persisted user and conversation ids
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that the backend is up and configured
    Health,

    /// List processed videos
    Sessions,

    /// Show the local user id and where it is stored
    Whoami,

    /// Process a YouTube URL
    Process {
        url: String,

        /// Transcription language
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// Upload and process a local video file
    Upload {
        path: PathBuf,

        #[arg(short, long)]
        language: Option<String>,
    },

    /// Delete a session and its data on the backend
    Delete { session: String },

    /// Print the helper document (overview, key points, action items)
    Document {
        session: String,

        /// Fetch the backend's markdown export instead of rendering locally
        #[arg(long)]
        markdown: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Semantic search over a transcript
    Search {
        session: String,
        query: String,

        #[arg(short = 'n', long, default_value_t = 5)]
        limit: u32,
    },

    /// Send a message, or print the conversation when no message is given
    Chat {
        session: String,
        message: Option<String>,

        /// Start a fresh conversation first
        #[arg(long)]
        new: bool,
    },

    /// Print the transcript
    Transcript {
        session: String,

        /// Without timestamps
        #[arg(long)]
        plain: bool,

        /// Only segments containing this text (case-insensitive)
        #[arg(short, long, conflicts_with = "plain")]
        filter: Option<String>,
    },

    /// Create clips by topic or by time range
    Snippet {
        session: String,

        #[arg(short, long, conflicts_with_all = ["start", "end"], required_unless_present = "start")]
        query: Option<String>,

        /// Start time as SS, MM:SS or H:MM:SS
        #[arg(long, requires = "end")]
        start: Option<String>,

        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Download a rendered clip by its backend path or file name
    DownloadSnippet {
        path: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "vidlens=debug" } else { "vidlens=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(verbose)
                    .without_time(),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(dir) = cli.state_dir.clone() {
        config = config.with_state_dir(dir);
    }

    if let Err(e) = run(config, cli.command).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(config: ClientConfig, command: Command) -> Result<()> {
    let mut app = App::open(&config)?;
    app.execute(command).await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn snippet_takes_query_or_full_range() {
        assert!(Cli::try_parse_from(["vidlens", "snippet", "s1", "--query", "intro"]).is_ok());
        assert!(Cli::try_parse_from(["vidlens", "snippet", "s1", "--start", "10", "--end", "20"]).is_ok());
        assert!(Cli::try_parse_from(["vidlens", "snippet", "s1"]).is_err());
        assert!(Cli::try_parse_from(["vidlens", "snippet", "s1", "--start", "10"]).is_err());
        assert!(
            Cli::try_parse_from(["vidlens", "snippet", "s1", "-q", "x", "--start", "1", "--end", "2"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "vidlens",
            "search",
            "s1",
            "neural nets",
            "-n",
            "3",
            "--api-url",
            "http://backend:8000/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:8000/api"));
        match cli.command {
            Command::Search { query, limit, .. } => {
                assert_eq!(query, "neural nets");
                assert_eq!(limit, 3);
            }
            _ => panic!("expected search"),
        }
    }
}
