//! In-memory chunk storage with creation-order indexing.

use std::collections::HashMap;

use crate::oracle::ChunkOutline;
use crate::types::{Chunk, ChunkId, ChunkerError};

/// Owns the chunk records for a single processing run.
///
/// Append/mutate-only while a run is in flight: chunks are never deleted or
/// merged mid-run. `chunk_index` values are allocated in creation order with
/// no gaps and never reassigned. Mutation is restricted to the engine; callers
/// read through [`list_chunks`](Self::list_chunks) and the export helpers.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkId, Chunk>,
    creation_order: Vec<ChunkId>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.creation_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creation_order.is_empty()
    }

    pub fn contains(&self, id: &ChunkId) -> bool {
        self.chunks.contains_key(id)
    }

    pub fn get(&self, id: &ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Allocates a fresh chunk seeded with one proposition. The new chunk's
    /// `chunk_index` equals the store size at creation time; the title and
    /// summary start empty and are filled in by the summary maintainer before
    /// the next proposition is examined.
    pub(crate) fn create_chunk(&mut self, initial_proposition: impl Into<String>) -> ChunkId {
        let id = ChunkId::allocate();
        let chunk = Chunk {
            id,
            chunk_index: self.creation_order.len(),
            title: String::new(),
            summary: String::new(),
            propositions: vec![initial_proposition.into()],
        };
        self.chunks.insert(id, chunk);
        self.creation_order.push(id);
        id
    }

    /// Appends a proposition to an existing chunk, preserving arrival order.
    pub(crate) fn append_proposition(
        &mut self,
        id: &ChunkId,
        text: impl Into<String>,
    ) -> Result<(), ChunkerError> {
        let chunk = self
            .chunks
            .get_mut(id)
            .ok_or(ChunkerError::ChunkNotFound { id: *id })?;
        chunk.propositions.push(text.into());
        Ok(())
    }

    /// Replaces a chunk's title and summary.
    pub(crate) fn set_digest(
        &mut self,
        id: &ChunkId,
        title: String,
        summary: String,
    ) -> Result<(), ChunkerError> {
        let chunk = self
            .chunks
            .get_mut(id)
            .ok_or(ChunkerError::ChunkNotFound { id: *id })?;
        chunk.title = title;
        chunk.summary = summary;
        Ok(())
    }

    /// Iterates chunks in `chunk_index` order. Read-only, side-effect free.
    pub fn list_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.creation_order
            .iter()
            .filter_map(|id| self.chunks.get(id))
    }

    /// The exact payload handed to the oracle's classification call,
    /// recomputed from current state on every invocation.
    pub fn summaries_view(&self) -> Vec<ChunkOutline> {
        self.list_chunks()
            .map(|chunk| ChunkOutline {
                id: chunk.id,
                chunk_index: chunk.chunk_index,
                title: chunk.title.clone(),
                summary: chunk.summary.clone(),
            })
            .collect()
    }

    /// Resets the store to empty, ready for a new batch.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.creation_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_chunk_allocates_sequential_indexes() {
        let mut store = ChunkStore::new();
        let a = store.create_chunk("alpha");
        let b = store.create_chunk("beta");
        let c = store.create_chunk("gamma");

        let indexes: Vec<usize> = store.list_chunks().map(|c| c.chunk_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn append_preserves_arrival_order() {
        let mut store = ChunkStore::new();
        let id = store.create_chunk("first");
        store.append_proposition(&id, "second").unwrap();
        store.append_proposition(&id, "third").unwrap();

        let chunk = store.get(&id).unwrap();
        assert_eq!(chunk.propositions, vec!["first", "second", "third"]);
    }

    #[test]
    fn append_to_unknown_chunk_is_an_error() {
        let mut store = ChunkStore::new();
        store.create_chunk("seed");
        let ghost = ChunkId::allocate();
        let err = store.append_proposition(&ghost, "lost").unwrap_err();
        assert!(matches!(err, ChunkerError::ChunkNotFound { id } if id == ghost));
    }

    #[test]
    fn summaries_view_tracks_current_state() {
        let mut store = ChunkStore::new();
        let id = store.create_chunk("seed");
        store
            .set_digest(&id, "Title".into(), "Summary".into())
            .unwrap();

        let view = store.summaries_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, id);
        assert_eq!(view[0].title, "Title");
        assert_eq!(view[0].summary, "Summary");

        store
            .set_digest(&id, "Title 2".into(), "Summary 2".into())
            .unwrap();
        assert_eq!(store.summaries_view()[0].title, "Title 2");
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = ChunkStore::new();
        store.create_chunk("one");
        store.create_chunk("two");
        store.clear();
        assert!(store.is_empty());
        assert!(store.summaries_view().is_empty());

        // Indexes restart from zero after a clear.
        let id = store.create_chunk("fresh");
        assert_eq!(store.get(&id).unwrap().chunk_index, 0);
    }
}
