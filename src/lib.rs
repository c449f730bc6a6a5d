//! ```text
//! Documents ──► segmenter::PropositionSplitter ──► ordered propositions
//!
//! Propositions ──► service::AgenticChunkerService ──┬─► oracle::ChunkOracle
//!                                                   │   (classify / summarize)
//!                                                   └─► store::ChunkStore
//!                                                       (chunks + titles + summaries)
//!
//! ChunkStore ──► export::{as_plain_text_list, as_structured_records,
//!                         render_human_readable}
//!             └─► downstream embedding & retrieval pipelines
//! ```
//!
pub mod config;
pub mod export;
pub mod oracle;
pub mod oracle_rig;
pub mod segmenter;
pub mod service;
pub mod store;
pub mod types;

pub use config::ChunkerConfig;
pub use export::{ChunkRecord, as_plain_text_list, as_structured_records, render_human_readable};
pub use oracle::{
    ChunkDigest, ChunkOracle, ChunkOutline, MockOracle, NullOracle, OracleDecision, OracleError,
    SharedOracle,
};
pub use oracle_rig::RigChunkOracle;
pub use segmenter::PropositionSplitter;
pub use service::{AgenticChunkerService, AgenticChunkerServiceBuilder, ProgressEvent};
pub use store::ChunkStore;
pub use types::{Anomaly, Chunk, ChunkId, ChunkerError, ChunkingReport, OracleOp, Proposition};
