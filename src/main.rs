// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Dispatch to the appropriate subcommand handler
// 4. Print the results as a table or JSON
// 5. Exit with proper code (0 = success, 2 = error, 130 = interrupted)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod dedup;
mod error;
mod extract;
mod filter;
mod trap;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::{CrawlConfig, QueryPolicy};
use crawl::{AdmissionPipeline, CrawlStats, CrawlSummary, HttpFetcher, StatsReport, Verdict};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Crawl {
            seed,
            config,
            workers,
            delay_ms,
            keep_query,
            max_pages,
            top,
            resume_stats,
            save_stats,
            json,
        } => {
            let mut crawl_config = load_config(config)?;
            if let Some(workers) = workers {
                crawl_config.workers = workers;
            }
            if let Some(delay_ms) = delay_ms {
                crawl_config.delay_ms = delay_ms;
            }
            if keep_query {
                crawl_config.query_policy = QueryPolicy::Retain;
            }
            if max_pages.is_some() {
                crawl_config.max_pages = max_pages;
            }
            let files = StatsFiles {
                resume: resume_stats.as_deref(),
                save: save_stats.as_deref(),
            };
            handle_crawl(&seed, &crawl_config, top, files, json).await
        }
        Commands::Check {
            url,
            base,
            config,
            json,
        } => {
            let crawl_config = load_config(config)?;
            handle_check(&url, base.as_deref(), &crawl_config, json)
        }
    }
}

// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<CrawlConfig> {
    let config = CrawlConfig::load_or_default(path.as_deref())
        .with_context(|| format!("loading config {:?}", path))?;
    Ok(config)
}

// Where crawl statistics are resumed from and saved to
struct StatsFiles<'a> {
    resume: Option<&'a Path>,
    save: Option<&'a Path>,
}

async fn handle_crawl(
    seed: &str,
    config: &CrawlConfig,
    top: usize,
    files: StatsFiles<'_>,
    json: bool,
) -> Result<i32> {
    let seed = filter::normalize_absolute(seed, config.query_policy)?;
    eprintln!("🔍 Crawling from: {}", seed);
    eprintln!("👷 Workers: {}", config.workers);

    let stats = match files.resume {
        Some(path) => {
            eprintln!("📂 Resuming statistics from: {}", path.display());
            CrawlStats::load(path)
                .with_context(|| format!("loading statistics {}", path.display()))?
        }
        None => CrawlStats::new(),
    };
    let stats = Arc::new(stats.with_subdomain_scope(config.subdomain_scope.clone()));

    let fetcher = Arc::new(HttpFetcher::new(config)?);
    let crawl = crawl::run_crawl(seed, config, fetcher, Arc::clone(&stats));

    // Ctrl-C stops the crawl but still saves what was collected
    let outcome = tokio::select! {
        result = crawl => Some(result?),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Some(path) = files.save {
        stats
            .save(path)
            .with_context(|| format!("saving statistics {}", path.display()))?;
        eprintln!("💾 Statistics saved to: {}", path.display());
    }

    let Some(summary) = outcome else {
        eprintln!("⚠️  Interrupted, crawl stopped early");
        return Ok(130);
    };

    let report = stats.report(top);
    if json {
        #[derive(Serialize)]
        struct Output<'a> {
            summary: &'a CrawlSummary,
            report: &'a StatsReport,
        }
        let output = Output {
            summary: &summary,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&summary, &report);
    }

    Ok(0)
}

#[derive(Serialize)]
struct CheckReport {
    input: String,
    normalized: Option<String>,
    verdict: &'static str,
    reason: Option<String>,
}

fn handle_check(raw: &str, base: Option<&str>, config: &CrawlConfig, json: bool) -> Result<i32> {
    let normalized = match base {
        Some(base) => {
            let base = filter::normalize_absolute(base, QueryPolicy::Retain)?;
            filter::normalize(raw, &base, config.query_policy)
        }
        None => filter::normalize_absolute(raw, config.query_policy),
    };

    let report = match normalized {
        Err(e) => CheckReport {
            input: raw.to_string(),
            normalized: None,
            verdict: "malformed",
            reason: Some(e.to_string()),
        },
        Ok(url) => {
            let pipeline = AdmissionPipeline::from_config(config)?;
            let (verdict, reason) = match pipeline.explain(&url) {
                Verdict::Scheduled => ("admit", None),
                Verdict::Seen => ("seen", None),
                Verdict::Rejected(rejection) => ("reject", Some(rejection.to_string())),
                Verdict::Trap(kind) => ("trap", Some(format!("{:?}", kind))),
            };
            CheckReport {
                input: raw.to_string(),
                normalized: Some(url.to_string()),
                verdict,
                reason,
            }
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<12} {}", "INPUT", report.input);
        println!("{:<12} {}", "NORMALIZED", report.normalized.as_deref().unwrap_or("-"));
        println!("{:<12} {}", "VERDICT", report.verdict);
        if let Some(reason) = &report.reason {
            println!("{:<12} {}", "REASON", reason);
        }
    }

    Ok(0)
}

// Prints the crawl statistics as human-readable tables
fn print_report(summary: &CrawlSummary, report: &StatsReport) {
    println!();
    println!("📊 Summary:");
    println!("   📄 Pages fetched: {}", summary.pages_fetched);
    println!("   ❌ Fetch failures: {}", summary.fetch_failures);
    println!("   🪤 Known traps skipped: {}", summary.known_traps_skipped);
    println!("   🔁 Near-duplicate pages: {}", summary.near_duplicates);
    println!("   ↪️  Redirects rejected: {}", summary.redirects_rejected);
    println!("   ➕ Links scheduled: {}", summary.links_scheduled);
    println!("   🚫 Links rejected: {}", summary.links_rejected);
    println!("   🌐 Unique pages: {}", report.unique_pages);
    if let Some(longest) = &report.longest_page {
        println!("   📏 Longest page: {} ({} words)", longest.url, longest.tokens);
    }

    println!();
    println!("{:<50} {:>10}", "SUBDOMAIN", "PAGES");
    println!("{}", "=".repeat(61));
    for count in &report.subdomains {
        println!("{:<50} {:>10}", count.key, count.count);
    }

    println!();
    println!("{:<50} {:>10}", "WORD", "COUNT");
    println!("{}", "=".repeat(61));
    for count in &report.top_words {
        println!("{:<50} {:>10}", count.key, count.count);
    }
}
