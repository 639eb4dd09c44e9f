//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Window;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;

/// ghrecap - a yearly recap of a GitHub user's activity
///
/// Pulls contributions, pull requests, issues, reviews, language bytes and
/// stars/forks growth for one user and one year, and writes a JSON recap.
///
/// Examples:
///   ghrecap --user octocat
///   ghrecap --user octocat --year 2024 --output octocat.json
///   ghrecap --user octocat --from 2025-03-01 --to 2025-08-31 --skip-growth
///   ghrecap --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub login to build the recap for
    #[arg(short, long, value_name = "LOGIN", required_unless_present = "init_config")]
    pub user: Option<String>,

    /// API token (bearer)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// REST API base URL
    ///
    /// Overrides the config file. Useful for GitHub Enterprise.
    #[arg(long, value_name = "URL", env = "GITHUB_API_BASE")]
    pub api_base: Option<String>,

    /// GraphQL endpoint URL
    #[arg(long = "graphql", value_name = "URL", env = "GITHUB_GRAPHQL")]
    pub graphql_endpoint: Option<String>,

    /// Year to recap (defaults to the current UTC year)
    #[arg(short, long, value_name = "YEAR", conflicts_with_all = ["from", "to"])]
    pub year: Option<i32>,

    /// Start of a custom window (YYYY-MM-DD), requires --to
    #[arg(long, value_name = "DATE", requires = "to")]
    pub from: Option<NaiveDate>,

    /// End of a custom window (YYYY-MM-DD), requires --from
    #[arg(long, value_name = "DATE", requires = "from")]
    pub to: Option<NaiveDate>,

    /// Output file path for the recap
    ///
    /// Defaults to recap_<year>.json
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum items pulled per search
    #[arg(long, value_name = "COUNT")]
    pub max_search: Option<usize>,

    /// Maximum repositories per contribution kind
    #[arg(long, value_name = "COUNT")]
    pub max_repositories: Option<u32>,

    /// Number of concurrent language lookups
    #[arg(long, value_name = "NUM")]
    pub language_concurrency: Option<usize>,

    /// Number of concurrent growth lookups
    #[arg(long, value_name = "NUM")]
    pub growth_concurrency: Option<usize>,

    /// Skip the stars/forks growth fetch
    #[arg(long)]
    pub skip_growth: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ghrecap.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ghrecap.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The login, empty if not set (should be validated first).
    pub fn login(&self) -> &str {
        self.user.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.login().trim().is_empty() {
            return Err("User login must not be empty".to_string());
        }

        if self.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err("An API token is required (--token or GITHUB_TOKEN)".to_string());
        }

        for (name, url) in [
            ("API base", self.api_base.as_deref()),
            ("GraphQL endpoint", self.graphql_endpoint.as_deref()),
        ] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!("{} must start with 'http://' or 'https://'", name));
                }
            }
        }

        self.window()?;

        for (name, value) in [
            ("Max search", self.max_search),
            ("Language concurrency", self.language_concurrency),
            ("Growth concurrency", self.growth_concurrency),
        ] {
            if value == Some(0) {
                return Err(format!("{} must be at least 1", name));
            }
        }

        if self.max_repositories == Some(0) {
            return Err("Max repositories must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// The recap window: `--from`/`--to` when given, otherwise the whole year.
    pub fn window(&self) -> Result<Window, String> {
        match (self.from, self.to) {
            (Some(_), Some(_)) if self.year.is_some() => {
                Err("--year cannot be combined with --from/--to".to_string())
            }
            (Some(from), Some(to)) => Window::from_dates(from, to)
                .ok_or_else(|| format!("--from ({}) must not be after --to ({})", from, to)),
            (None, None) => {
                let year = self.year.unwrap_or_else(|| Utc::now().year());
                Window::for_year(year).ok_or_else(|| format!("Invalid year: {}", year))
            }
            _ => Err("--from and --to must be given together".to_string()),
        }
    }

    /// Output path, `recap_<year>.json` unless given.
    pub fn output_path(&self, year: i32) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("recap_{}.json", year)))
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
