//! Umbra command-line interface.
//!
//! Thin shell over the scanner and analyzer crates: streams per-site results
//! to stdout as probes complete, or emits the full report as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use umbra_analyzer::{AnalysisMode, ProfileAnalyzer, ProfileRecord};
use umbra_catalog::{PlatformLoader, PlatformRegistry};
use umbra_core::{AppConfig, Handle};
use umbra_proxy::ProxyPool;
use umbra_scanner::{ProbeOutcome, ScanEngine, ScanEvent, ScannerSettings};

#[derive(Parser)]
#[command(name = "umbra", version, about = "Probe public platforms for a handle")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the platform catalog for a handle
    Scan {
        /// The username (or email, with --email) to search for
        handle: String,

        /// Treat the handle argument as an email and derive the local part
        #[arg(long)]
        email: bool,

        /// Probe only the first N catalog entries
        #[arg(long)]
        limit: Option<usize>,

        /// Emit events as JSON lines instead of formatted text
        #[arg(long)]
        json: bool,

        /// Wait for the full report instead of streaming per-site results
        #[arg(long)]
        no_stream: bool,

        /// Summarize found profiles after the scan
        #[arg(long)]
        analyze: bool,

        /// Use the configured model for the summary (implies --analyze)
        #[arg(long)]
        model_backed: bool,

        /// Platform catalog directory (defaults to the configured one)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show the proxy pool configuration and health
    Proxies,

    /// Summarize a JSON list of found profiles
    Analyze {
        /// Path to a JSON array of profile records
        #[arg(long)]
        input: PathBuf,

        /// Use the configured model instead of heuristics only
        #[arg(long)]
        model_backed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("umbra=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_with_env().context("load configuration")?;

    match cli.command {
        Command::Scan {
            handle,
            email,
            limit,
            json,
            no_stream,
            analyze,
            model_backed,
            catalog,
        } => {
            let handle = if email {
                Handle::from_email(&handle)?
            } else {
                Handle::new(&handle)?
            };

            let engine = build_engine(&config, catalog)?;
            let found = if no_stream {
                run_blocking(&engine, &handle, limit, json).await?
            } else {
                run_streaming(&engine, &handle, limit, json).await?
            };

            if analyze || model_backed {
                summarize(&config, &handle, found, model_backed, json).await?;
            }
        }

        Command::Proxies => {
            let settings = ScannerSettings::from_config(&config);
            let pool =
                ProxyPool::from_config(&config.proxy, settings.timeout, &settings.user_agent)?;
            println!("{}", serde_json::to_string_pretty(&pool.snapshot())?);
        }

        Command::Analyze {
            input,
            model_backed,
        } => {
            let contents = std::fs::read_to_string(&input)
                .with_context(|| format!("read {}", input.display()))?;
            let profiles: Vec<ProfileRecord> =
                serde_json::from_str(&contents).context("parse profile records")?;

            let report = build_analyzer(&config, model_backed)?
                .analyze(&profiles, analysis_mode(model_backed))
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Assemble the scan engine from configuration.
fn build_engine(config: &AppConfig, catalog: Option<PathBuf>) -> anyhow::Result<ScanEngine> {
    let loader = match catalog.or_else(|| config.catalog.dir.clone()) {
        Some(dir) => PlatformLoader::new(dir)?,
        None => PlatformLoader::with_default_dir()?,
    };
    let registry = Arc::new(PlatformRegistry::load_from(&loader)?);

    let settings = ScannerSettings::from_config(config);
    let pool = Arc::new(ProxyPool::from_config(
        &config.proxy,
        settings.timeout,
        &settings.user_agent,
    )?);

    Ok(ScanEngine::new(registry, pool, settings)?)
}

/// Stream per-site events to stdout as they complete; returns found profiles.
async fn run_streaming(
    engine: &ScanEngine,
    handle: &Handle,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<Vec<ProbeOutcome>> {
    let mut stream = engine.start_scan(handle, limit)?;
    let mut found = Vec::new();

    while let Some(event) = stream.next_event().await {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        }
        match event {
            ScanEvent::SiteResult(outcome) => {
                if !json {
                    print_outcome(&outcome);
                }
                if outcome.found {
                    found.push(outcome);
                }
            }
            ScanEvent::SearchComplete { summary, .. } => {
                if !json {
                    println!(
                        "\n{} of {} platforms have a profile for '{}'",
                        summary.found_count, summary.total, handle
                    );
                }
            }
        }
    }

    Ok(found)
}

/// Run the blocking variant and print the full report; returns found profiles.
async fn run_blocking(
    engine: &ScanEngine,
    handle: &Handle,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<Vec<ProbeOutcome>> {
    let report = engine.scan_to_completion(handle, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for outcome in &report.outcomes {
            print_outcome(outcome);
        }
        println!(
            "\n{} of {} platforms have a profile for '{}'",
            report.found_count, report.total, handle
        );
    }

    Ok(report.outcomes.into_iter().filter(|o| o.found).collect())
}

fn print_outcome(outcome: &ProbeOutcome) {
    let latency = outcome
        .latency_ms
        .map_or_else(String::new, |ms| format!(" ({ms} ms)"));
    let via = if outcome.via_proxy { " [proxy]" } else { "" };
    let reason = outcome
        .reason
        .as_deref()
        .map_or_else(String::new, |r| format!(" - {r}"));

    println!(
        "[{:<12}] {:<20} {}{latency}{via}{reason}",
        outcome.state.as_str(),
        outcome.site,
        outcome.url
    );
}

fn analysis_mode(model_backed: bool) -> AnalysisMode {
    if model_backed {
        AnalysisMode::ModelBacked
    } else {
        AnalysisMode::Heuristic
    }
}

fn build_analyzer(config: &AppConfig, model_backed: bool) -> anyhow::Result<ProfileAnalyzer> {
    let mut llm_config = config.llm.clone();
    if model_backed {
        llm_config.enabled = true;
    }
    Ok(ProfileAnalyzer::from_config(&llm_config)?)
}

/// Feed found profiles to the analyzer and print the report.
async fn summarize(
    config: &AppConfig,
    handle: &Handle,
    found: Vec<ProbeOutcome>,
    model_backed: bool,
    json: bool,
) -> anyhow::Result<()> {
    if found.is_empty() {
        if !json {
            println!("\nNothing to analyze: no profiles found.");
        }
        return Ok(());
    }

    let records: Vec<ProfileRecord> = found.iter().map(to_profile_record).collect();
    let analyzer = build_analyzer(config, model_backed)?.with_username_pivot(handle.as_str());

    let report = analyzer
        .analyze(&records, analysis_mode(model_backed))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n--- analysis ({:?}) ---", report.mode);
        println!("{}", report.summary);
        if !report.traits.is_empty() {
            println!("traits: {}", report.traits.join(", "));
        }
        if !report.risks.is_empty() {
            println!("risks: {}", report.risks.join(", "));
        }
        if let Some(error) = &report.llm_error {
            println!("model unavailable: {error}");
        }
    }

    Ok(())
}

fn to_profile_record(outcome: &ProbeOutcome) -> ProfileRecord {
    ProfileRecord {
        platform: outcome.site.clone(),
        url: Some(outcome.url.clone()),
        display_name: outcome.display_name.clone(),
        bio: outcome.bio.clone(),
        avatar: outcome.avatar.clone(),
        category: Some(outcome.category.display_name().to_string()),
    }
}
