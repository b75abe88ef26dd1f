//! Label session driver
//!
//! Walks the pending hosts once, in shuffled order. For every host:
//! `Loaded → Presented → Collecting → Committed`. Platforms without any
//! occurrence are never asked about; they get [`RelevanceCode::NotPresent`].

use hostrel_common::{load_host_aggregate, Error, HostAggregate, LabelCodes, Platform, RelevanceCode, Result};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::ledger::LabelLedger;
use crate::sink::{ReviewSink, TableSpec};

/// Per-host progress through the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loaded,
    Presented,
    Collecting,
    Committed,
}

/// How handling one host ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    Committed(LabelCodes),
    /// Annotator ended the session; the host stays pending
    Quit,
}

/// Totals for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub labeled: u64,
    /// Hosts rejected by the ledger as already labeled
    pub skipped: u64,
    pub quit: bool,
}

/// Answers that end the session instead of giving a code
fn is_quit(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "q" | "quit")
}

/// One row per article: platform counts, then the article URL
pub fn article_table(aggregate: &HostAggregate) -> TableSpec {
    let mut table = TableSpec::new(Platform::ALL.iter().map(|p| p.as_str()).chain(["URL"]));
    for article in &aggregate.articles {
        let mut cells: Vec<String> = Platform::ALL.iter().map(|&p| article.count(p).to_string()).collect();
        cells.push(article.url.clone());
        table.push_row(cells);
    }
    table
}

/// Ask for one code per present platform
///
/// Invalid answers are reported and asked again. Returns `None` when the
/// annotator quits or the input closes.
pub fn collect_codes(aggregate: &HostAggregate, sink: &mut dyn ReviewSink) -> Result<Option<LabelCodes>> {
    let mut codes = LabelCodes::all_absent();

    for platform in Platform::ALL {
        if !aggregate.is_present(platform) {
            continue;
        }

        let question = RelevanceCode::prompt_for(platform);
        loop {
            let Some(answer) = sink.prompt(&question)? else {
                return Ok(None);
            };
            if is_quit(&answer) {
                return Ok(None);
            }
            match RelevanceCode::parse_input(&answer) {
                Ok(code) => {
                    codes.set(platform, code);
                    break;
                }
                Err(e @ Error::InvalidRelevanceCode(_)) => {
                    debug!("Rejected input for {}: {}", platform, e);
                    sink.show_line(&e.to_string())?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(Some(codes))
}

/// Interactive labeling over the ledger's pending hosts
pub struct LabelSession {
    pool: SqlitePool,
    ledger: LabelLedger,
    limit: Option<usize>,
}

impl LabelSession {
    pub fn new(pool: SqlitePool) -> Self {
        let ledger = LabelLedger::new(pool.clone());
        Self {
            pool,
            ledger,
            limit: None,
        }
    }

    /// Stop after this many hosts have been labeled
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn ledger(&self) -> &LabelLedger {
        &self.ledger
    }

    fn advance(hostname: &str, state: &mut SessionState, next: SessionState) {
        debug!("{}: {:?} -> {:?}", hostname, state, next);
        *state = next;
    }

    /// Take one host from loading to commit
    pub async fn label_host(&self, hostname: &str, sink: &mut dyn ReviewSink) -> Result<HostOutcome> {
        let aggregate = load_host_aggregate(&self.pool, hostname).await?;
        let mut state = SessionState::Loaded;

        sink.show_line("")?;
        sink.show_line(&format!(
            "Host {} ({} articles, {} with video)",
            hostname,
            aggregate.article_count,
            aggregate.articles.len()
        ))?;
        sink.show_table(&article_table(&aggregate))?;
        Self::advance(hostname, &mut state, SessionState::Presented);

        if aggregate.is_empty() {
            warn!("{} has no video occurrences; every platform marked not present", hostname);
        }

        Self::advance(hostname, &mut state, SessionState::Collecting);
        let Some(codes) = collect_codes(&aggregate, sink)? else {
            return Ok(HostOutcome::Quit);
        };

        self.ledger.commit_label(hostname, &codes).await?;
        Self::advance(hostname, &mut state, SessionState::Committed);

        Ok(HostOutcome::Committed(codes))
    }

    /// Label pending hosts until done, the limit is reached, or the annotator quits
    ///
    /// A host the ledger reports as already labeled is logged and skipped;
    /// any other error ends the session.
    pub async fn run<R: Rng + ?Sized>(&self, sink: &mut dyn ReviewSink, rng: &mut R) -> Result<SessionSummary> {
        let status = self.ledger.status().await?;
        let pending = self.ledger.pending_hosts(rng).await?;
        let mut summary = SessionSummary::default();

        for hostname in &pending {
            if self.limit.is_some_and(|limit| summary.labeled as usize >= limit) {
                info!("Session limit of {} hosts reached", summary.labeled);
                break;
            }

            sink.show_line(&format!(
                "[{}/{} labeled]",
                status.labeled + summary.labeled,
                status.total_hosts
            ))?;

            match self.label_host(hostname, sink).await {
                Ok(HostOutcome::Committed(_)) => summary.labeled += 1,
                Ok(HostOutcome::Quit) => {
                    info!("Annotator ended the session at {}", hostname);
                    summary.quit = true;
                    break;
                }
                Err(Error::DuplicateLabel(host)) => {
                    error!("{} was labeled elsewhere during this session; skipping", host);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Session finished: {} labeled, {} skipped{}",
            summary.labeled,
            summary.skipped,
            if summary.quit { " (quit)" } else { "" }
        );
        Ok(summary)
    }
}
