//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ghrecap.toml` files. The API token is never read from the file.

use crate::analysis::aggregator::DEFAULT_TOP_LANGUAGES;
use crate::github::growth::DEFAULT_GROWTH_CONCURRENCY;
use crate::github::languages::DEFAULT_LANGUAGE_CONCURRENCY;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = ".ghrecap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoints and timeouts.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Fetch limits and concurrency.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// GraphQL endpoint URL.
    #[serde(default = "default_graphql_endpoint")]
    pub graphql_endpoint: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            graphql_endpoint: default_graphql_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_graphql_endpoint() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_timeout() -> u64 {
    45
}

/// Limits for the fetch flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum items pulled per search (pull requests, issues opened, issues closed).
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Maximum repositories per contribution kind (enforced server-side).
    #[serde(default = "default_max_repositories")]
    pub max_repositories: u32,

    /// Concurrent language lookups.
    #[serde(default = "default_language_concurrency")]
    pub language_concurrency: usize,

    /// Concurrent growth lookups.
    #[serde(default = "default_growth_concurrency")]
    pub growth_concurrency: usize,

    /// Skip the stars/forks growth fetch.
    #[serde(default)]
    pub skip_growth: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_search_results: default_max_search_results(),
            max_repositories: default_max_repositories(),
            language_concurrency: default_language_concurrency(),
            growth_concurrency: default_growth_concurrency(),
            skip_growth: false,
        }
    }
}

fn default_max_search_results() -> usize {
    1000
}

fn default_max_repositories() -> u32 {
    100
}

fn default_language_concurrency() -> usize {
    DEFAULT_LANGUAGE_CONCURRENCY
}

fn default_growth_concurrency() -> usize {
    DEFAULT_GROWTH_CONCURRENCY
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of languages in the ranking.
    #[serde(default = "default_top_languages")]
    pub top_languages: usize,

    /// Pretty-print the JSON document.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_languages: default_top_languages(),
            pretty: true,
        }
    }
}

fn default_top_languages() -> usize {
    DEFAULT_TOP_LANGUAGES
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_base) = args.api_base {
            self.github.api_base = api_base.clone();
        }
        if let Some(ref graphql) = args.graphql_endpoint {
            self.github.graphql_endpoint = graphql.clone();
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }

        if let Some(max_search) = args.max_search {
            self.fetch.max_search_results = max_search;
        }
        if let Some(max_repositories) = args.max_repositories {
            self.fetch.max_repositories = max_repositories;
        }
        if let Some(concurrency) = args.language_concurrency {
            self.fetch.language_concurrency = concurrency;
        }
        if let Some(concurrency) = args.growth_concurrency {
            self.fetch.growth_concurrency = concurrency;
        }

        // Flags always override
        if args.skip_growth {
            self.fetch.skip_growth = true;
        }
    }

    /// Check the merged settings. Zero limits, timeouts or concurrency are rejected.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("github.api_base", &self.github.api_base),
            ("github.graphql_endpoint", &self.github.graphql_endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{} must start with 'http://' or 'https://'", name);
            }
        }

        if self.github.timeout_seconds == 0 {
            bail!("github.timeout_seconds must be at least 1");
        }

        for (name, value) in [
            ("fetch.max_search_results", self.fetch.max_search_results),
            ("fetch.language_concurrency", self.fetch.language_concurrency),
            ("fetch.growth_concurrency", self.fetch.growth_concurrency),
            ("report.top_languages", self.report.top_languages),
        ] {
            if value == 0 {
                bail!("{} must be at least 1", name);
            }
        }

        if self.fetch.max_repositories == 0 {
            bail!("fetch.max_repositories must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
