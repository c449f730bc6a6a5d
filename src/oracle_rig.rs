//! Live oracle backed by a rig-core completion model.
//!
//! Works with any [`CompletionModel`] provider (Ollama, OpenAI, …). Both
//! operations ask for JSON-only replies and parse them with the helpers in
//! [`crate::oracle`]; transport failures surface as
//! [`OracleError::Unavailable`] and unparsable replies as
//! [`OracleError::Malformed`], so the engine can retry the former and fall
//! back on the latter.

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message};
use rig::message::AssistantContent;
use tracing::debug;

use crate::oracle::{
    ChunkDigest, ChunkOracle, ChunkOutline, OracleDecision, OracleError, parse_classification,
    parse_digest,
};

const CLASSIFY_PREAMBLE: &str = "You decide whether a proposition belongs with an existing chunk \
of related propositions. You are given the current chunks as a JSON array of objects with id, \
chunk_index, title, and summary fields, followed by one new proposition. Reply with JSON only: \
{\"decision\":\"assign\",\"chunk_id\":\"<id>\"} when the proposition belongs with an existing \
chunk, or {\"decision\":\"new_chunk\"} when it fits none of them. No prose, no code fences.";

const SUMMARIZE_PREAMBLE: &str = "You maintain the title and summary of a chunk of related \
propositions. Given every proposition currently in the chunk, reply with JSON only: \
{\"title\":\"...\",\"summary\":\"...\"}. The title is a few words; the summary is one or two \
sentences describing the aggregate content. Both must be non-empty. No prose, no code fences.";

/// [`ChunkOracle`] implementation over a rig completion model.
pub struct RigChunkOracle<M: CompletionModel> {
    model: M,
    temperature: f64,
}

impl<M: CompletionModel> RigChunkOracle<M> {
    /// Wraps a completion model. Temperature defaults to 0.0: classification
    /// and summarization want the most deterministic answer available.
    pub fn new(model: M) -> Self {
        Self {
            model,
            temperature: 0.0,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    async fn complete(&self, preamble: &str, prompt: String) -> Result<String, OracleError> {
        let request = self
            .model
            .completion_request(Message::user(prompt))
            .preamble(preamble.to_owned())
            .temperature(self.temperature)
            .build();

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|err| OracleError::Unavailable(err.to_string()))?;

        let text: String = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(OracleError::Malformed("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl<M: CompletionModel> ChunkOracle for RigChunkOracle<M> {
    async fn classify(
        &self,
        proposition: &str,
        outlines: &[ChunkOutline],
    ) -> Result<OracleDecision, OracleError> {
        let outlines_json = serde_json::to_string_pretty(outlines)
            .map_err(|err| OracleError::Malformed(format!("outline payload: {err}")))?;
        let prompt = format!(
            "Current chunks:\n{outlines_json}\n\nNew proposition:\n{proposition}"
        );
        let raw = self.complete(CLASSIFY_PREAMBLE, prompt).await?;
        debug!(reply = %raw.trim(), "classification reply");
        parse_classification(&raw)
    }

    async fn summarize(&self, propositions: &[String]) -> Result<ChunkDigest, OracleError> {
        let mut listing = String::new();
        for (idx, proposition) in propositions.iter().enumerate() {
            listing.push_str(&format!("{}. {proposition}\n", idx + 1));
        }
        let prompt = format!("Propositions in the chunk:\n{listing}");
        let raw = self.complete(SUMMARIZE_PREAMBLE, prompt).await?;
        debug!(reply = %raw.trim(), "summary reply");
        parse_digest(&raw)
    }
}
