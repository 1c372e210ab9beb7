//! Application facade and command handlers.
//!
//! `App` is what the dashboard and chat consumers hold: it owns the store and
//! the configured source, and exposes records, metrics and `resolve`.

use std::io::Write;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::{AppConfig, Commands, SourceConfig};
use crate::data::{
    FileSource, GrantCollection, GrantRecord, GrantSource, GrantStore, GrantsResponse, HttpSource,
    LoadOutcome, LoadReport, StaticSource,
};
use crate::format::{format_currency_compact, Usd};
use crate::metrics::DerivedMetrics;
use crate::query::{self, GREETING};

/// Maximum characters shown for agency and recipient names in listings
const NAME_MAX_LEN: usize = 40;

/// Application state
pub struct App {
    config: AppConfig,
    store: GrantStore,
    source: Box<dyn GrantSource>,
}

impl App {
    /// Create an App using the source named by `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        let source: Box<dyn GrantSource> = match &config.source {
            SourceConfig::Sample => Box::new(StaticSource::sample()),
            SourceConfig::File(path) => Box::new(FileSource::new(path.clone())),
            SourceConfig::Http { url, page, per_page } => Box::new(
                HttpSource::new(url.clone(), *page, *per_page)
                    .context("Failed to create HTTP client")?,
            ),
        };
        Ok(Self::with_source(config, source))
    }

    /// Create an App around an explicit source
    pub fn with_source(config: AppConfig, source: Box<dyn GrantSource>) -> Self {
        App {
            config,
            store: GrantStore::new(),
            source,
        }
    }

    /// Load (or reload) the store from the configured source
    pub async fn load(&self) -> LoadOutcome {
        self.store.load(self.source.as_ref()).await
    }

    /// Loaded grants, if the store is ready
    pub fn records(&self) -> Option<GrantCollection> {
        self.store.snapshot().collection().cloned()
    }

    /// Dashboard figures for the loaded grants, if the store is ready
    pub fn metrics(&self) -> Option<DerivedMetrics> {
        self.records().map(|grants| DerivedMetrics::compute(&grants))
    }

    /// Answer a chat question against the current snapshot
    pub fn resolve(&self, text: &str) -> String {
        query::resolve(text, &self.store.snapshot())
    }

    /// Load, giving up cleanly if the user interrupts
    pub async fn load_interruptible(&self) -> Result<LoadOutcome> {
        tokio::select! {
            outcome = self.load() => Ok(outcome),
            Ok(()) = tokio::signal::ctrl_c() => {
                // The load future is dropped here, so the store must leave `Loading` itself
                self.store.cancel();
                bail!("Load cancelled")
            }
        }
    }

    /// Load, then fail with the stored reason unless the store became ready
    async fn load_ready(&self) -> Result<LoadReport> {
        match self.load_interruptible().await? {
            LoadOutcome::Loaded(report) => {
                let dropped = self.store.dropped_count();
                if dropped > 0 {
                    info!("{dropped} malformed grants were skipped");
                }
                Ok(report)
            }
            LoadOutcome::Failed(reason) => bail!("Error loading data: {reason}"),
            other => bail!("Grant data not loaded ({other:?})"),
        }
    }

    /// Chat loop: greet, then answer each non-blank line until EOF, `exit` or `quit`
    pub async fn chat<R, W>(&self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(output, "{GREETING}")?;
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
                break;
            }
            writeln!(output, "{}", self.resolve(text))?;
            output.flush()?;
        }
        Ok(())
    }

    /// Download one page from the endpoint and save it to the cache path
    async fn sync(&self) -> Result<()> {
        let source = HttpSource::new(
            self.config.api_url.clone(),
            self.config.page,
            self.config.per_page,
        )
        .context("Failed to create HTTP client")?;
        let body = source
            .fetch_text()
            .await
            .with_context(|| format!("Failed to fetch {}", source.describe()))?;

        // Refuse to cache something the loader could not read back
        let parsed: GrantsResponse =
            serde_json::from_str(&body).context("Endpoint returned an unexpected response")?;

        let path = &self.config.cache_path;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        tokio::fs::write(path, &body)
            .await
            .with_context(|| format!("Failed to write cache: {path:?}"))?;

        println!(
            "Saved {} grants from {} to {}",
            parsed.result.grants.len(),
            source.describe(),
            path.display()
        );
        Ok(())
    }
}

/// Text form of the dashboard figures
pub fn render_summary(metrics: &DerivedMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Total Grant Value:   {}\n",
        format_currency_compact(metrics.total_value)
    ));
    out.push_str(&format!(
        "Total Savings:       {}\n",
        format_currency_compact(metrics.total_savings)
    ));
    out.push_str(&format!(
        "Average Grant Value: {}\n",
        format_currency_compact(metrics.average_value)
    ));
    out.push_str(&format!(
        "Grants: {}  Recipients: {}  Agencies: {}\n",
        metrics.grant_count, metrics.distinct_recipients, metrics.distinct_agencies
    ));
    if let Some((first, last)) = metrics.date_range {
        out.push_str(&format!("Dates: {first} to {last}\n"));
    }
    out
}

/// Text listing of grants, one per line
pub fn render_grants(grants: &[GrantRecord], limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(grants.len()).min(grants.len());
    let mut out = String::new();
    for grant in &grants[..shown] {
        // Zero savings is shown like unreported savings
        let savings = grant
            .savings
            .filter(|&s| s > 0)
            .map(|s| format_currency_compact(Usd::from_dollars(s)))
            .unwrap_or_else(|| "N/A".to_string());
        out.push_str(&format!(
            "{:<10} {:<40} {:<40} {:>9} {:>9}  {}\n",
            grant.date,
            truncate(&grant.agency),
            truncate(&grant.recipient),
            format_currency_compact(Usd::from_dollars(grant.value)),
            savings,
            grant.link.as_deref().unwrap_or("N/A"),
        ));
    }
    if shown < grants.len() {
        out.push_str(&format!("... {} more\n", grants.len() - shown));
    }
    out
}

/// Shorten long names for the listing
fn truncate(name: &str) -> String {
    if name.chars().count() > NAME_MAX_LEN {
        let head: String = name.chars().take(NAME_MAX_LEN - 3).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Run a CLI command
pub async fn run(config: AppConfig, command: Commands) -> Result<()> {
    let app = App::new(config)?;

    match command {
        Commands::Summary { json } => {
            let report = app.load_ready().await?;
            let metrics = app.metrics().context("Grant data not loaded")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                print!("{}", render_summary(&metrics));
                if let Some(meta) = report.meta {
                    println!(
                        "Upstream: {} grants across {} pages",
                        meta.total_results, meta.pages
                    );
                }
            }
        }
        Commands::Grants { limit, json } => {
            app.load_ready().await?;
            let grants = app.records().context("Grant data not loaded")?;
            if json {
                let shown = &grants[..limit.unwrap_or(grants.len()).min(grants.len())];
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else {
                print!("{}", render_grants(&grants, limit));
            }
        }
        Commands::Ask { question } => {
            // A failed load still answers, with the not-available message
            app.load_interruptible().await?;
            println!("{}", app.resolve(&question.join(" ")));
        }
        Commands::Chat => {
            if let LoadOutcome::Failed(reason) = app.load_interruptible().await? {
                eprintln!("Error loading data: {reason}");
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            app.chat(stdin, &mut std::io::stdout()).await?;
        }
        Commands::Sync => app.sync().await?,
    }

    Ok(())
}
