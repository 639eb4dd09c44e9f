//! ghrecap - yearly recap of a GitHub user's activity
//!
//! Fetches contributions, pull requests, issues, reviews, language bytes and
//! stars/forks growth, then reduces them into one JSON document.
//!
//! Exit codes:
//!   0 - Success (language or growth lookups may have been skipped with warnings)
//!   1 - Runtime error (invalid arguments, config, a fatal fetch, write failure)

mod analysis;
mod cli;
mod config;
mod error;
mod github;
mod models;
mod report;

use analysis::{build_recap, RecapInputs, RecapOptions};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE};
use github::{ClientConfig, GitHubClient};
use indicatif::{ProgressBar, ProgressStyle};
use models::{LanguageBytes, Recap, RecapMeta, Window};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args)?;

    info!("ghrecap v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_recap(args).await {
        error!("Recap failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ghrecap.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize endpoints, limits and concurrency.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load settings, build the client and produce the recap.
async fn run_recap(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let login = args.login().to_string();
    let window = args.window().map_err(anyhow::Error::msg)?;
    let output = args.output_path(window.year());

    let client = GitHubClient::new(ClientConfig {
        token: args.token.clone().unwrap_or_default(),
        api_base: config.github.api_base.clone(),
        graphql_endpoint: config.github.graphql_endpoint.clone(),
        timeout_seconds: config.github.timeout_seconds,
    })
    .context("Failed to build API client")?;

    if !args.quiet {
        println!("📥 Fetching activity for {} ({})", login, window.search_range());
    }

    let (recap, warnings) =
        fetch_and_write_recap(&client, &config, &login, window, &output, args.quiet).await?;

    let duration = start_time.elapsed().as_secs_f64();
    if !args.quiet {
        println!("\n📊 {}", report::generate_summary_text(&recap, warnings));
        println!("   Duration: {:.1}s", duration);
        println!("\n✅ Recap saved to: {}", output.display());
    }
    info!("Recap written to {} in {:.1}s", output.display(), duration);

    Ok(())
}

/// Run the fetch flows, build the recap and write it to `output`.
///
/// Returns the recap and the number of fan-out warnings. Nothing is written
/// when one of the summary or search fetches fails.
async fn fetch_and_write_recap(
    client: &GitHubClient,
    config: &Config,
    login: &str,
    window: Window,
    output: &Path,
    quiet: bool,
) -> Result<(Recap, usize)> {
    // Step 1: contribution summary, searches. Any failure here is fatal.
    let summary =
        github::fetch_contribution_summary(client, login, &window, config.fetch.max_repositories)
            .await
            .context("Failed to fetch contribution summary")?;

    let pull_requests = github::search_pull_requests(
        client,
        &github::pull_requests_created(login, &window),
        config.fetch.max_search_results,
    )
    .await
    .context("Failed to search pull requests")?;

    let (issues_opened, issues_closed) = github::search_issues_opened_closed(
        client,
        login,
        &window,
        config.fetch.max_search_results,
    )
    .await
    .context("Failed to search issues")?;

    info!(
        "Fetched {} pull requests, {} opened issues, {} closed issues",
        pull_requests.len(),
        issues_opened.len(),
        issues_closed.len()
    );

    // Step 2: per-repository fan-outs. Failures degrade to warnings.
    let mut warnings = 0;

    if !quiet {
        println!("🔤 Fetching repository languages...");
    }
    let repositories = summary.repositories();
    let languages = github::fetch_languages(
        client,
        &repositories,
        config.fetch.language_concurrency,
        &progress_bar(quiet),
    )
    .await;
    if !languages.is_complete() {
        if let Some(ref err) = languages.first_error {
            warn!(
                "Language lookup failed for {} repositories (first error: {})",
                languages.failed, err
            );
        }
        warnings += languages.failed;
    }
    let languages: LanguageBytes = languages.value;

    let growth = if config.fetch.skip_growth {
        info!("Skipping growth fetch");
        None
    } else {
        if !quiet {
            println!("⭐ Calculating stars and forks growth...");
        }
        match github::fetch_growth(
            client,
            login,
            &window,
            config.fetch.growth_concurrency,
            &progress_bar(quiet),
        )
        .await
        {
            Ok(growth) => {
                if let Some(ref err) = growth.first_error {
                    warn!(
                        "Growth lookup failed for {} repositories (first error: {})",
                        growth.failed, err
                    );
                    warnings += growth.failed;
                }
                Some(growth.value)
            }
            Err(e) => {
                warn!("Growth fetch failed: {}", e);
                warnings += 1;
                None
            }
        }
    };

    // Step 3: aggregate and write
    let meta = RecapMeta {
        user: login.to_string(),
        year: window.year(),
        window,
        generated_at: Utc::now(),
    };
    let inputs = RecapInputs {
        summary: &summary,
        pull_requests: &pull_requests,
        issues_opened: &issues_opened,
        issues_closed: &issues_closed,
        languages: &languages,
        growth: growth.as_ref(),
    };
    let options = RecapOptions {
        top_languages: config.report.top_languages,
    };
    let recap = build_recap(meta, &inputs, &options);

    report::write_json_report(&recap, output, config.report.pretty)?;

    Ok((recap, warnings))
}

/// Progress bar for a fan-out, hidden in quiet mode.
fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::tests::test_client;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.fetch.skip_growth = true;
        config
    }

    fn summary_body(repos: &[&str]) -> Value {
        let by_repo: Vec<Value> = repos
            .iter()
            .map(|repo| {
                json!({
                    "repository": {"nameWithOwner": repo, "isPrivate": false},
                    "contributions": {"totalCount": 2}
                })
            })
            .collect();
        json!({
            "data": {
                "user": {
                    "contributionsCollection": {
                        "totalCommitContributions": 6,
                        "totalPullRequestContributions": 0,
                        "totalIssueContributions": 0,
                        "totalPullRequestReviewContributions": 0,
                        "contributionCalendar": {
                            "weeks": [{"contributionDays": [
                                {"date": "2025-01-01", "contributionCount": 6}
                            ]}]
                        },
                        "commitContributionsByRepository": by_repo
                    }
                }
            }
        })
    }

    fn empty_search_body() -> Value {
        json!({
            "data": {
                "search": {
                    "issueCount": 0,
                    "pageInfo": {"hasNextPage": false, "endCursor": null},
                    "nodes": []
                }
            }
        })
    }

    #[tokio::test]
    async fn test_fatal_fetch_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("recap.json");
        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();

        let result =
            fetch_and_write_recap(&client, &test_config(), "octo", window, &output, true).await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to fetch contribution summary"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_language_failure_still_writes_recap() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({"variables": {"maxRepos": 100}})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(summary_body(&["a/one", "a/two", "c/broken"])),
            )
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_search_body()))
            .expect(3)
            .mount(&server)
            .await;
        for (repo, body) in [
            ("a/one", json!({"Rust": 100, "Shell": 10})),
            ("a/two", json!({"Rust": 50})),
        ] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/{}/languages", repo)))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/repos/c/broken/languages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("recap.json");
        let client = test_client(&server);
        let window = Window::for_year(2025).unwrap();

        let (recap, warnings) =
            fetch_and_write_recap(&client, &test_config(), "octo", window, &output, true)
                .await
                .unwrap();
        assert_eq!(warnings, 1);
        assert!(recap.growth.is_none());

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["meta"]["user"], "octo");
        assert_eq!(written["meta"]["year"], 2025);
        assert_eq!(written["totals"]["commits"], 6);
        assert_eq!(written["languages"]["weighted_bytes"]["Rust"], 150);
        assert_eq!(written["languages"]["weighted_bytes"]["Shell"], 10);
        assert_eq!(written["languages"]["top"][0]["language"], "Rust");
    }
}
