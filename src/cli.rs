// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Two subcommands:
// - crawl: crawl from a seed URL and print the statistics
// - check: explain what the admission pipeline thinks of one URL
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "focus-crawler",
    version,
    about = "A focused-domain web crawler with duplicate and crawler-trap filtering",
    long_about = "focus-crawler crawls a set of allowed domains from a seed URL. Every discovered \
                  link is normalized, filtered, deduplicated with a bloom filter and checked for \
                  crawler traps before it is scheduled."
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides this)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl from a seed URL until the frontier is empty
    ///
    /// Example: focus-crawler crawl https://www.ics.uci.edu/ --workers 4
    Crawl {
        /// Seed URL to start from
        seed: String,

        /// TOML config file (defaults are used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Politeness delay between requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Treat query strings as part of a URL's identity
        #[arg(long)]
        keep_query: bool,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// How many of the most frequent words to report
        #[arg(long, default_value_t = 50)]
        top: usize,

        /// Start from statistics saved by an earlier crawl
        #[arg(long, value_name = "FILE")]
        resume_stats: Option<PathBuf>,

        /// Save the statistics as JSON when the crawl ends or is interrupted
        #[arg(long, value_name = "FILE")]
        save_stats: Option<PathBuf>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show how a single URL would be treated by the admission pipeline
    ///
    /// Example: focus-crawler check "/events/2023/2023/2023/" --base https://www.ics.uci.edu/
    Check {
        /// URL or href to check
        url: String,

        /// Page to resolve a relative href against
        #[arg(long)]
        base: Option<String>,

        /// TOML config file (defaults are used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the verdict as JSON
        #[arg(long)]
        json: bool,
    },
}
