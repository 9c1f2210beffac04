mod category;
mod error;
mod fetch;
mod output;
mod parser;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use category::YearFilter;
use fetch::{FetchConfig, Fetcher};
use output::{Summaries, YearEntry};

#[derive(Parser)]
#[command(
    name = "gp_summaries",
    about = "Grand Prix race summaries by year, extracted from Wikipedia"
)]
struct Cli {
    /// Diagnostic trace lines, plus paragraph counts in the output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a category page and extract every year's race summary
    Run {
        /// Wikipedia category listing the yearly race articles
        #[arg(long, default_value = category::DEFAULT_CATEGORY_URL)]
        category_url: String,
        /// Output JSON path
        #[arg(short, long)]
        output: PathBuf,
        /// Seconds to pause after each request
        #[arg(long, default_value_t = 0.0)]
        sleep: f64,
        /// HTTP timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Only scrape this year
        #[arg(long)]
        only_year: Option<i32>,
        /// Skip the current year, if listed
        #[arg(long)]
        exclude_current_year: bool,
    },
    /// Extract a single saved article (no network)
    Local {
        /// Year key to write the result under
        #[arg(long)]
        year: i32,
        /// Saved article HTML
        #[arg(long)]
        html: PathBuf,
        /// Output JSON path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the year pages found on a category page
    Years {
        #[arg(long, default_value = category::DEFAULT_CATEGORY_URL)]
        category_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gp_summaries=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();

    let result = match cli.command {
        Commands::Run {
            category_url,
            output,
            sleep,
            timeout,
            only_year,
            exclude_current_year,
        } => {
            let config = FetchConfig {
                sleep: Duration::try_from_secs_f64(sleep)
                    .context("--sleep must be a non-negative number of seconds")?,
                timeout: Duration::from_secs(timeout),
                ..Default::default()
            };
            let filter = YearFilter {
                current_year: chrono::Local::now().year(),
                only_year,
                exclude_current_year,
            };
            run_crawl(config, &category_url, filter, &output, cli.verbose).await
        }
        Commands::Local { year, html, output } => {
            let markup = std::fs::read_to_string(&html)
                .with_context(|| format!("Failed to read {}", html.display()))?;
            let summary = parser::process_page(&markup)
                .with_context(|| format!("Failed to extract {}", html.display()))?;
            report(year, &summary);

            let mut out = Summaries::default();
            out.insert(year, YearEntry::from_summary(&summary, cli.verbose));
            out.write(&output)?;
            println!("Wrote {} with 1 year (local)", output.display());
            Ok(())
        }
        Commands::Years { category_url } => {
            let fetcher = Fetcher::new(FetchConfig::default())?;
            let links = category::fetch_year_links(&fetcher, &category_url).await?;
            if links.is_empty() {
                println!("No year pages found.");
            }
            for (year, url) in &links {
                println!("{}  {}", year, url);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Discover, filter, then fetch and extract each year oldest first.
/// A year that fails to fetch or parse is logged and left out.
async fn run_crawl(
    config: FetchConfig,
    category_url: &str,
    filter: YearFilter,
    output: &Path,
    verbose: bool,
) -> Result<()> {
    let fetcher = Fetcher::new(config)?;
    let links = category::fetch_year_links(&fetcher, category_url).await?;
    let links: BTreeMap<i32, String> = filter.apply(links);
    info!("Crawling {} year pages", links.len());

    let pb = if verbose {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(links.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut tally = CrawlTally::default();

    for (&year, url) in &links {
        pb.set_message(year.to_string());
        debug!("[child] {} -> {}", year, url);

        let fetched = fetcher.fetch(url).await;
        if let Err(e) = tally.record(year, fetched, verbose) {
            pb.suspend(|| warn!("Skipping {}: {:#}", year, e));
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if tally.out.is_empty() {
        warn!("No race summaries extracted");
    }
    tally.out.write(output)?;
    println!(
        "Wrote {} with {} years ({} skipped)",
        output.display(),
        tally.out.len(),
        tally.skipped
    );
    Ok(())
}

/// Years extracted so far, plus how many were dropped.
#[derive(Default)]
struct CrawlTally {
    out: Summaries,
    skipped: usize,
}

impl CrawlTally {
    /// Extract one fetched page into the output. A fetch or extraction
    /// failure counts the year as skipped and hands the error back for logging.
    fn record(&mut self, year: i32, fetched: Result<String>, verbose: bool) -> Result<()> {
        let extracted = fetched.and_then(|html| {
            parser::process_page(&html).map_err(anyhow::Error::from)
        });
        match extracted {
            Ok(summary) => {
                report(year, &summary);
                self.out.insert(year, YearEntry::from_summary(&summary, verbose));
                Ok(())
            }
            Err(e) => {
                self.skipped += 1;
                Err(e)
            }
        }
    }
}

fn report(year: i32, summary: &parser::PageSummary) {
    debug!(
        "[{}] date={:?} intro={} race_detail={}",
        year, summary.date, summary.lead_count, summary.race_count
    );
    if summary.race_html.is_empty() {
        debug!("[{}] no Race section, lead only", year);
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
