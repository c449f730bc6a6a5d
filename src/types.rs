//! Core data types shared across the chunking pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier for a chunk.
///
/// Allocated once when the chunk is created and never reused, even across
/// [`clear`](crate::store::ChunkStore::clear) calls. Serializes as the
/// hyphenated UUID string, which is also the form the oracle sees and is
/// expected to echo back in classification replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub(crate) fn allocate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a chunk id from its string form, as echoed by the oracle.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An atomic, short, self-contained text unit derived from a source document.
///
/// The chunking engine consumes only `text`; `source` and `doc_type` travel
/// along so downstream stages can attribute chunks back to their documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposition {
    pub text: String,
    pub source: String,
    pub doc_type: String,
}

impl Proposition {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: "unknown".to_string(),
            doc_type: "unknown".to_string(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }
}

/// A cluster of propositions judged semantically coherent, with a maintained
/// title and summary.
///
/// `chunk_index` reflects creation order and is stable for the lifetime of the
/// chunk. `title` and `summary` are regenerated after every structural change,
/// so they always describe the current `propositions` content.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub chunk_index: usize,
    pub title: String,
    pub summary: String,
    pub propositions: Vec<String>,
}

impl Chunk {
    /// Space-joined concatenation of the propositions, in acceptance order.
    pub fn joined_text(&self) -> String {
        self.propositions.join(" ")
    }
}

/// Which oracle operation an anomaly or retry relates to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleOp {
    Classify,
    Summarize,
}

impl std::fmt::Display for OracleOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleOp::Classify => write!(f, "classify"),
            OracleOp::Summarize => write!(f, "summarize"),
        }
    }
}

/// A recorded, non-fatal deviation from expected oracle behaviour.
///
/// Anomalies never abort a run; each one corresponds to a safe fallback the
/// engine already applied (a new chunk for classification trouble, a
/// deterministic placeholder for summarization trouble).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The oracle stayed unreachable through all retry attempts.
    OracleUnavailable { operation: OracleOp, detail: String },
    /// The oracle answered, but not in the expected shape.
    MalformedResponse { operation: OracleOp, detail: String },
    /// Classification named a chunk id the store does not hold.
    UnknownChunkReference { referenced: String },
}

/// Fatal errors surfaced by the chunking service.
///
/// Oracle failures are absorbed into fallbacks and reported as [`Anomaly`]
/// values; only invariant violations reach this type.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// A decision targeted a chunk the store does not hold. The engine
    /// validates oracle references before acting on them, so hitting this
    /// indicates a bug in the decision policy itself.
    #[error("chunk {id} not found in store")]
    ChunkNotFound { id: ChunkId },
}

/// Outcome counters for one `add_propositions` batch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingReport {
    /// Propositions that reached the decision policy.
    pub processed: usize,
    /// Propositions rejected because they were empty after trimming.
    pub skipped_empty: usize,
    /// Chunks created during the batch.
    pub chunks_created: usize,
    /// Propositions appended to pre-existing chunks.
    pub assignments: usize,
    /// Oracle calls retried after a transient failure.
    pub oracle_retries: usize,
    /// Non-fatal deviations recorded during the batch.
    pub anomalies: Vec<Anomaly>,
    /// Wall-clock duration of the batch.
    pub duration_ms: u64,
}

impl ChunkingReport {
    /// `true` when the batch completed without recording any anomaly.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}
