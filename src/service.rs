//! The agentic chunking engine: decision policy and summary maintenance.
//!
//! [`AgenticChunkerService`] consumes propositions strictly in input order.
//! Each proposition causes at most one oracle classification call, at most one
//! chunk creation, and exactly one summary regeneration for the affected
//! chunk — regeneration is never deferred, so the next decision always sees
//! up-to-date summaries. Oracle degradation never halts a batch; it only
//! fragments the output into more singleton chunks, with every fallback
//! recorded as an [`Anomaly`] in the returned [`ChunkingReport`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::config::ChunkerConfig;
use crate::export;
use crate::oracle::{ChunkDigest, ChunkOracle, OracleDecision, OracleError, SharedOracle};
use crate::store::ChunkStore;
use crate::types::{Anomaly, ChunkId, ChunkerError, ChunkingReport, OracleOp, Proposition};

/// Progress notifications delivered through the optional callback configured
/// on the builder.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// A proposition opened a new chunk.
    ChunkCreated { id: ChunkId, chunk_index: usize },
    /// A proposition was appended to an existing chunk.
    PropositionAssigned { id: ChunkId },
    /// A proposition was rejected as empty before the decision policy.
    PropositionSkipped,
}

type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Incremental, stateful chunker that groups propositions into semantically
/// coherent chunks by consulting a [`ChunkOracle`].
///
/// The service owns its [`ChunkStore`]; mutating methods take `&mut self`, so
/// a single instance is never mutated concurrently. Processing is strictly
/// sequential because each decision depends on the summaries left by the
/// previous one.
///
/// # Examples
///
/// ```rust,ignore
/// use propsmith::{AgenticChunkerService, RigChunkOracle};
///
/// let oracle = RigChunkOracle::new(completion_model);
/// let mut service = AgenticChunkerService::builder().oracle(oracle).build();
///
/// let report = service.add_propositions(propositions).await?;
/// println!("{}", service.pretty_print());
/// ```
pub struct AgenticChunkerService {
    oracle: SharedOracle,
    config: ChunkerConfig,
    store: ChunkStore,
    on_progress: Option<ProgressCallback>,
}

impl AgenticChunkerService {
    /// Create a new builder for constructing a service.
    pub fn builder() -> AgenticChunkerServiceBuilder {
        AgenticChunkerServiceBuilder::default()
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Resets the store to empty, ready for a new batch.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Deterministic, ordered textual rendering of the current chunks.
    pub fn pretty_print(&self) -> String {
        export::render_human_readable(&self.store)
    }

    /// Processes propositions strictly in input order, mutating the store.
    ///
    /// Re-adding identical text creates a new proposition entry; there is no
    /// deduplication. Whitespace-only entries are skipped and counted in the
    /// report. The only fatal error is [`ChunkerError::ChunkNotFound`], which
    /// signals an engine bug rather than an oracle problem.
    #[instrument(skip_all)]
    pub async fn add_propositions<I, S>(
        &mut self,
        propositions: I,
    ) -> Result<ChunkingReport, ChunkerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let started = Instant::now();
        let mut report = ChunkingReport::default();

        for text in propositions {
            let text = text.into();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                report.skipped_empty += 1;
                self.notify(&ProgressEvent::PropositionSkipped);
                continue;
            }
            self.process_one(trimmed, &mut report).await?;
            report.processed += 1;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            processed = report.processed,
            skipped = report.skipped_empty,
            chunks = self.store.len(),
            anomalies = report.anomalies.len(),
            "batch complete"
        );
        Ok(report)
    }

    /// Convenience wrapper for metadata-carrying propositions produced by the
    /// segmenter; only the text participates in chunking.
    pub async fn add_proposition_records<I>(
        &mut self,
        propositions: I,
    ) -> Result<ChunkingReport, ChunkerError>
    where
        I: IntoIterator<Item = Proposition>,
    {
        self.add_propositions(propositions.into_iter().map(|p| p.text))
            .await
    }

    /// Runs one proposition through the decision policy and refreshes the
    /// affected chunk's digest before returning.
    async fn process_one(
        &mut self,
        text: &str,
        report: &mut ChunkingReport,
    ) -> Result<(), ChunkerError> {
        let target = if self.store.is_empty() {
            None
        } else {
            self.decide(text, report).await
        };

        let affected = match target {
            Some(id) => {
                self.store.append_proposition(&id, text)?;
                report.assignments += 1;
                debug!(chunk = %id, "proposition assigned to existing chunk");
                self.notify(&ProgressEvent::PropositionAssigned { id });
                id
            }
            None => {
                let id = self.store.create_chunk(text);
                let chunk_index = self.store.len() - 1;
                report.chunks_created += 1;
                debug!(chunk = %id, chunk_index, "created new chunk");
                self.notify(&ProgressEvent::ChunkCreated { id, chunk_index });
                id
            }
        };

        self.refresh_digest(&affected, report).await
    }

    /// Classification step. Returns the validated target chunk, or `None`
    /// when the proposition should open a new chunk (either because the
    /// oracle said so or because a fallback applied).
    async fn decide(&self, text: &str, report: &mut ChunkingReport) -> Option<ChunkId> {
        match self.classify_with_retry(text, report).await? {
            OracleDecision::Assign(id) if self.store.contains(&id) => Some(id),
            OracleDecision::Assign(id) => {
                warn!(referenced = %id, "oracle referenced unknown chunk; starting a new one");
                report.anomalies.push(Anomaly::UnknownChunkReference {
                    referenced: id.to_string(),
                });
                None
            }
            OracleDecision::NewChunk => None,
        }
    }

    async fn classify_with_retry(
        &self,
        text: &str,
        report: &mut ChunkingReport,
    ) -> Option<OracleDecision> {
        let outlines = self.store.summaries_view();
        let mut attempt: u32 = 0;
        loop {
            match self.oracle.classify(text, &outlines).await {
                Ok(decision) => return Some(decision),
                Err(OracleError::Malformed(detail)) => {
                    warn!(%detail, "malformed classification; defaulting to new chunk");
                    report.anomalies.push(Anomaly::MalformedResponse {
                        operation: OracleOp::Classify,
                        detail,
                    });
                    return None;
                }
                Err(OracleError::Unavailable(detail)) => {
                    if attempt as usize >= self.config.max_oracle_retries {
                        warn!(%detail, "classification unavailable after retries; defaulting to new chunk");
                        report.anomalies.push(Anomaly::OracleUnavailable {
                            operation: OracleOp::Classify,
                            detail,
                        });
                        return None;
                    }
                    report.oracle_retries += 1;
                    tokio::time::sleep(self.config.retry_backoff * 2u32.pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Summary maintainer: regenerates the chunk's title and summary from its
    /// full, current proposition list. Falls back to a deterministic
    /// placeholder rather than ever leaving a chunk unlabeled.
    async fn refresh_digest(
        &mut self,
        id: &ChunkId,
        report: &mut ChunkingReport,
    ) -> Result<(), ChunkerError> {
        let propositions = self
            .store
            .get(id)
            .ok_or(ChunkerError::ChunkNotFound { id: *id })?
            .propositions
            .clone();

        let digest = match self.summarize_with_retry(&propositions, report).await {
            Some(digest) => digest,
            None => fallback_digest(&propositions, &self.config),
        };
        self.store.set_digest(id, digest.title, digest.summary)
    }

    async fn summarize_with_retry(
        &self,
        propositions: &[String],
        report: &mut ChunkingReport,
    ) -> Option<ChunkDigest> {
        let mut attempt: u32 = 0;
        loop {
            match self.oracle.summarize(propositions).await {
                Ok(digest) => return Some(digest),
                Err(OracleError::Malformed(detail)) => {
                    warn!(%detail, "malformed summary; using placeholder digest");
                    report.anomalies.push(Anomaly::MalformedResponse {
                        operation: OracleOp::Summarize,
                        detail,
                    });
                    return None;
                }
                Err(OracleError::Unavailable(detail)) => {
                    if attempt as usize >= self.config.max_oracle_retries {
                        warn!(%detail, "summarization unavailable after retries; using placeholder digest");
                        report.anomalies.push(Anomaly::OracleUnavailable {
                            operation: OracleOp::Summarize,
                            detail,
                        });
                        return None;
                    }
                    report.oracle_retries += 1;
                    tokio::time::sleep(self.config.retry_backoff * 2u32.pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    fn notify(&self, event: &ProgressEvent) {
        if let Some(callback) = &self.on_progress {
            callback(event);
        }
    }
}

/// Deterministic label derived from the first proposition, used when the
/// oracle cannot produce a digest. Guaranteed non-empty.
fn fallback_digest(propositions: &[String], config: &ChunkerConfig) -> ChunkDigest {
    let first = propositions
        .first()
        .map(String::as_str)
        .unwrap_or("untitled");
    ChunkDigest {
        title: truncate_chars(first, config.fallback_title_chars),
        summary: truncate_chars(first, config.fallback_summary_chars),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "untitled".to_string();
    }
    trimmed.chars().take(max.max(1)).collect()
}

/// Builder for [`AgenticChunkerService`] instances.
#[derive(Default)]
pub struct AgenticChunkerServiceBuilder {
    oracle: Option<SharedOracle>,
    config: Option<ChunkerConfig>,
    on_progress: Option<ProgressCallback>,
}

impl AgenticChunkerServiceBuilder {
    /// Set the oracle to consult.
    ///
    /// This is required before calling [`build()`](Self::build).
    #[must_use]
    pub fn oracle(mut self, oracle: impl ChunkOracle + 'static) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    /// Set the oracle from an existing Arc.
    ///
    /// Use this to share an oracle across services.
    #[must_use]
    pub fn oracle_arc(mut self, oracle: SharedOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Override the default [`ChunkerConfig`].
    #[must_use]
    pub fn config(mut self, config: ChunkerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a progress callback invoked for every processed proposition.
    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Build the service.
    ///
    /// # Panics
    ///
    /// Panics if [`oracle()`](Self::oracle) was not called.
    pub fn build(self) -> AgenticChunkerService {
        AgenticChunkerService {
            oracle: self
                .oracle
                .expect("AgenticChunkerServiceBuilder requires an oracle"),
            config: self.config.unwrap_or_default(),
            store: ChunkStore::new(),
            on_progress: self.on_progress,
        }
    }

    /// Build the service, returning `None` if no oracle was set.
    pub fn try_build(self) -> Option<AgenticChunkerService> {
        Some(AgenticChunkerService {
            oracle: self.oracle?,
            config: self.config.unwrap_or_default(),
            store: ChunkStore::new(),
            on_progress: self.on_progress,
        })
    }
}
