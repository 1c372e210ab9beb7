//! Command-line interface argument parsing for fda-grants.
//!
//! - `fda-grants summary`
//! - `fda-grants ask "What's the highest grant?"`
//! - `fda-grants --url https://api.doge.gov/savings/grants --per-page 50 grants`
//! - `fda-grants sync`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::DEFAULT_API_URL;

/// Environment variable naming a saved grants response to load
pub const FILE_ENV: &str = "FDA_GRANTS_FILE";
/// Environment variable naming the upstream endpoint
pub const URL_ENV: &str = "FDA_GRANTS_URL";

/// Grant-data dashboard figures and the $FDA question-answering assistant.
#[derive(Parser, Debug)]
#[command(name = "fda-grants")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where grants are loaded from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Load a saved grants response from this file
    #[arg(long, global = true, env = FILE_ENV)]
    pub file: Option<PathBuf>,

    /// Fetch grants from this endpoint
    #[arg(long, global = true, env = URL_ENV)]
    pub url: Option<String>,

    /// Page to request from the endpoint
    #[arg(long, global = true, default_value_t = 1)]
    pub page: u32,

    /// Grants per page to request from the endpoint
    #[arg(long, global = true, default_value_t = 10)]
    pub per_page: u32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the dashboard figures for the loaded grants
    Summary {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the loaded grants
    Grants {
        /// Show at most this many grants
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Answer a single question about the grants
    Ask {
        /// The question, e.g. "What's the highest grant?"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Chat with the assistant over stdin/stdout
    Chat,

    /// Download a page of grants from the endpoint into the local cache
    Sync,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Resolved choice of grant source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Sample,
    File(PathBuf),
    Http {
        url: String,
        page: u32,
        per_page: u32,
    },
}

/// Configuration derived from CLI arguments and the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    /// Where `sync` writes and where a default run looks for a saved response
    pub cache_path: PathBuf,
    /// Endpoint used by `sync`
    pub api_url: String,
    pub page: u32,
    pub per_page: u32,
}

impl AppConfig {
    /// Create AppConfig from the parsed source arguments.
    ///
    /// An explicit file wins over an explicit URL. With neither, a previously
    /// synced response is used if present, else the built-in sample.
    pub fn from_source_args(args: SourceArgs) -> Self {
        Self::with_cache_path(args, default_cache_path())
    }

    /// Same as `from_source_args`, with the cache location supplied
    fn with_cache_path(args: SourceArgs, cache_path: PathBuf) -> Self {
        let api_url = args.url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let source = match (args.file, args.url) {
            (Some(path), _) => SourceConfig::File(path),
            (None, Some(url)) => SourceConfig::Http {
                url,
                page: args.page,
                per_page: args.per_page,
            },
            (None, None) if cache_path.exists() => SourceConfig::File(cache_path.clone()),
            (None, None) => SourceConfig::Sample,
        };

        AppConfig {
            source,
            cache_path,
            api_url,
            page: args.page,
            per_page: args.per_page,
        }
    }
}

/// `<cache dir>/fda-grants/grants.json`, falling back to the working directory
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fda-grants")
        .join("grants.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file_wins() {
        let config = AppConfig::from_source_args(SourceArgs {
            file: Some(PathBuf::from("saved.json")),
            url: Some("https://example.test/grants".to_string()),
            page: 1,
            per_page: 10,
        });
        assert_eq!(config.source, SourceConfig::File(PathBuf::from("saved.json")));
        assert_eq!(config.api_url, "https://example.test/grants");
    }

    #[test]
    fn test_url_selects_http() {
        let config = AppConfig::from_source_args(SourceArgs {
            file: None,
            url: Some("https://example.test/grants".to_string()),
            page: 3,
            per_page: 50,
        });
        assert_eq!(
            config.source,
            SourceConfig::Http {
                url: "https://example.test/grants".to_string(),
                page: 3,
                per_page: 50,
            }
        );
    }

    #[test]
    fn test_default_source_without_cache_is_sample() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("grants.json");
        let config = AppConfig::with_cache_path(SourceArgs::default(), cache.clone());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.source, SourceConfig::Sample);
        assert_eq!(config.cache_path, cache);
    }

    #[test]
    fn test_default_source_prefers_synced_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("grants.json");
        std::fs::write(&cache, "{}").unwrap();
        let config = AppConfig::with_cache_path(SourceArgs::default(), cache.clone());
        assert_eq!(config.source, SourceConfig::File(cache));
    }

    #[test]
    fn test_default_cache_path_layout() {
        let path = default_cache_path();
        assert!(path.ends_with("fda-grants/grants.json"));
    }

    #[test]
    fn test_parse_ask_joins_words() {
        let cli = Cli::try_parse_from(["fda-grants", "ask", "highest", "grant"]).unwrap();
        match cli.command {
            Commands::Ask { question } => assert_eq!(question.join(" "), "highest grant"),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.source.page, 1);
        assert_eq!(cli.source.per_page, 10);
    }

    #[test]
    fn test_parse_global_source_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fda-grants",
            "grants",
            "--limit",
            "3",
            "--file",
            "saved.json",
        ])
        .unwrap();
        assert_eq!(cli.source.file, Some(PathBuf::from("saved.json")));
        assert!(matches!(cli.command, Commands::Grants { limit: Some(3), json: false }));
    }
}
