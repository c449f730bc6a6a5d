//! Oracle abstraction consulted by the chunking engine.
//!
//! The engine needs exactly two capabilities from a language model: deciding
//! whether a proposition belongs with an existing chunk, and producing a
//! title/summary pair for a chunk's current contents. [`ChunkOracle`] pins
//! that contract down so the decision policy stays testable with
//! deterministic stand-ins ([`MockOracle`], [`NullOracle`]) while production
//! code plugs in a live model via
//! [`RigChunkOracle`](crate::oracle_rig::RigChunkOracle).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ChunkId;

/// Snapshot of one chunk's labelling handed to the oracle at classification
/// time. Recomputed from store state for every call, never cached across
/// calls.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkOutline {
    pub id: ChunkId,
    pub chunk_index: usize,
    pub title: String,
    pub summary: String,
}

/// Classification verdict for a single proposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleDecision {
    /// The proposition belongs with the named chunk's existing content.
    Assign(ChunkId),
    /// The proposition fits no existing chunk.
    NewChunk,
}

/// Title/summary pair describing a chunk's aggregate content.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkDigest {
    pub title: String,
    pub summary: String,
}

/// Failures an oracle implementation may surface. Both variants are
/// distinguishable so the engine can retry transport trouble but not
/// syntactically bad answers.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Transport-level failure (network, timeout, quota). Retryable.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// The oracle answered, but the reply could not be parsed into the
    /// expected shape. Not retryable.
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// The classification/summarization capability consulted by the chunking
/// engine.
///
/// Implementations must never return empty output silently: a summarize call
/// that cannot produce a non-empty title and summary reports
/// [`OracleError::Malformed`] instead.
#[async_trait]
pub trait ChunkOracle: Send + Sync {
    /// Decide whether `proposition` joins one of the outlined chunks or
    /// starts a new one.
    async fn classify(
        &self,
        proposition: &str,
        outlines: &[ChunkOutline],
    ) -> Result<OracleDecision, OracleError>;

    /// Produce a fresh title/summary pair from a chunk's full, current
    /// proposition list.
    async fn summarize(&self, propositions: &[String]) -> Result<ChunkDigest, OracleError>;
}

/// Shared handle to an oracle implementation.
pub type SharedOracle = Arc<dyn ChunkOracle>;

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ClassifyReply {
    decision: String,
    #[serde(default)]
    chunk_id: Option<String>,
}

/// Strips a surrounding markdown code fence, if present. Models routinely
/// wrap JSON replies in ```json fences regardless of instructions.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parses a raw classification reply into a decision.
///
/// Expected shapes: `{"decision":"assign","chunk_id":"<uuid>"}` or
/// `{"decision":"new_chunk"}`. Anything else is [`OracleError::Malformed`].
pub fn parse_classification(raw: &str) -> Result<OracleDecision, OracleError> {
    let body = strip_code_fence(raw);
    let reply: ClassifyReply = serde_json::from_str(body)
        .map_err(|err| OracleError::Malformed(format!("classification reply: {err}")))?;
    match reply.decision.as_str() {
        "new_chunk" => Ok(OracleDecision::NewChunk),
        "assign" => {
            let raw_id = reply.chunk_id.unwrap_or_default();
            let id = ChunkId::parse(&raw_id).ok_or_else(|| {
                OracleError::Malformed(format!("assign decision with unparsable id '{raw_id}'"))
            })?;
            Ok(OracleDecision::Assign(id))
        }
        other => Err(OracleError::Malformed(format!(
            "unknown decision '{other}'"
        ))),
    }
}

/// Parses a raw summarization reply into a digest.
///
/// Expected shape: `{"title":"…","summary":"…"}` with both fields non-empty
/// after trimming.
pub fn parse_digest(raw: &str) -> Result<ChunkDigest, OracleError> {
    let body = strip_code_fence(raw);
    let digest: ChunkDigest = serde_json::from_str(body)
        .map_err(|err| OracleError::Malformed(format!("summary reply: {err}")))?;
    if digest.title.trim().is_empty() || digest.summary.trim().is_empty() {
        return Err(OracleError::Malformed(
            "summary reply with empty title or summary".to_string(),
        ));
    }
    Ok(ChunkDigest {
        title: digest.title.trim().to_string(),
        summary: digest.summary.trim().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Deterministic oracles
// ---------------------------------------------------------------------------

/// Oracle that never groups: every proposition starts a new chunk and digests
/// are derived from the first proposition. Useful when no model is available
/// and for exercising pipelines without network access; output degenerates to
/// singleton chunks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullOracle;

#[async_trait]
impl ChunkOracle for NullOracle {
    async fn classify(
        &self,
        _proposition: &str,
        _outlines: &[ChunkOutline],
    ) -> Result<OracleDecision, OracleError> {
        Ok(OracleDecision::NewChunk)
    }

    async fn summarize(&self, propositions: &[String]) -> Result<ChunkDigest, OracleError> {
        Ok(counting_digest(propositions))
    }
}

type ClassifyFn =
    dyn Fn(&str, &[ChunkOutline]) -> Result<OracleDecision, OracleError> + Send + Sync;
type SummarizeFn = dyn Fn(&[String]) -> Result<ChunkDigest, OracleError> + Send + Sync;

/// Scripted oracle for deterministic tests and offline runs.
///
/// Behaviour is supplied as plain closures, so tests can express arbitrary
/// decision sequences (including failures) without any async machinery.
pub struct MockOracle {
    classify_fn: Box<ClassifyFn>,
    summarize_fn: Box<SummarizeFn>,
}

impl MockOracle {
    pub fn new(
        classify: impl Fn(&str, &[ChunkOutline]) -> Result<OracleDecision, OracleError>
        + Send
        + Sync
        + 'static,
        summarize: impl Fn(&[String]) -> Result<ChunkDigest, OracleError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            classify_fn: Box::new(classify),
            summarize_fn: Box::new(summarize),
        }
    }

    /// Classify with the given closure; summaries encode the proposition
    /// count, which makes stale summaries detectable in assertions.
    pub fn with_classify(
        classify: impl Fn(&str, &[ChunkOutline]) -> Result<OracleDecision, OracleError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self::new(classify, |props| Ok(counting_digest(props)))
    }

    /// Every proposition starts a new chunk.
    pub fn always_new() -> Self {
        Self::with_classify(|_, _| Ok(OracleDecision::NewChunk))
    }

    /// Every proposition after the first is assigned to the first chunk.
    pub fn assign_first() -> Self {
        Self::with_classify(|_, outlines| {
            let first = outlines
                .first()
                .map(|outline| OracleDecision::Assign(outline.id))
                .unwrap_or(OracleDecision::NewChunk);
            Ok(first)
        })
    }
}

#[async_trait]
impl ChunkOracle for MockOracle {
    async fn classify(
        &self,
        proposition: &str,
        outlines: &[ChunkOutline],
    ) -> Result<OracleDecision, OracleError> {
        (self.classify_fn)(proposition, outlines)
    }

    async fn summarize(&self, propositions: &[String]) -> Result<ChunkDigest, OracleError> {
        (self.summarize_fn)(propositions)
    }
}

/// Digest whose summary embeds the proposition count; assertions on summary
/// freshness key off that count.
pub fn counting_digest(propositions: &[String]) -> ChunkDigest {
    let first = propositions
        .first()
        .map(String::as_str)
        .unwrap_or("untitled");
    let lead: String = first.chars().take(32).collect();
    ChunkDigest {
        title: format!("Chunk: {lead}"),
        summary: format!(
            "{} proposition(s), starting with: {lead}",
            propositions.len()
        ),
    }
}
