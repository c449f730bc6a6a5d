//! Read-only views over a [`ChunkStore`] for downstream consumers.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::store::ChunkStore;

/// Embedding-ready representation of a chunk: the shape the downstream
/// embedding step consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_index: usize,
    pub title: String,
    pub summary: String,
    /// Space-joined propositions in acceptance order.
    pub content: String,
}

/// One string per chunk, each the space-joined concatenation of its
/// propositions, ordered by `chunk_index`. Pure function of current state.
pub fn as_plain_text_list(store: &ChunkStore) -> Vec<String> {
    store.list_chunks().map(|chunk| chunk.joined_text()).collect()
}

/// One record per chunk, ordered by `chunk_index`.
pub fn as_structured_records(store: &ChunkStore) -> Vec<ChunkRecord> {
    store
        .list_chunks()
        .map(|chunk| ChunkRecord {
            chunk_index: chunk.chunk_index,
            title: chunk.title.clone(),
            summary: chunk.summary.clone(),
            content: chunk.joined_text(),
        })
        .collect()
}

/// Deterministic, ordered textual rendering for diagnostics. No mutation, no
/// I/O beyond returning the text.
pub fn render_human_readable(store: &ChunkStore) -> String {
    let mut out = String::new();
    for chunk in store.list_chunks() {
        let _ = writeln!(out, "Chunk #{} ({})", chunk.chunk_index, chunk.id);
        let _ = writeln!(out, "  Title:   {}", chunk.title);
        let _ = writeln!(out, "  Summary: {}", chunk.summary);
        let _ = writeln!(out, "  Propositions ({}):", chunk.propositions.len());
        for proposition in &chunk.propositions {
            let _ = writeln!(out, "    - {proposition}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ChunkStore {
        let mut store = ChunkStore::new();
        let a = store.create_chunk("apples are red");
        store.append_proposition(&a, "pears are green").unwrap();
        store
            .set_digest(&a, "Fruit".into(), "Colors of fruit.".into())
            .unwrap();
        let b = store.create_chunk("the moon orbits the earth");
        store
            .set_digest(&b, "Astronomy".into(), "Orbital facts.".into())
            .unwrap();
        store
    }

    #[test]
    fn plain_text_list_joins_propositions_in_order() {
        let store = sample_store();
        let texts = as_plain_text_list(&store);
        assert_eq!(
            texts,
            vec![
                "apples are red pears are green".to_string(),
                "the moon orbits the earth".to_string(),
            ]
        );
    }

    #[test]
    fn structured_records_match_chunk_indexes() {
        let store = sample_store();
        let records = as_structured_records(&store);
        assert_eq!(records.len(), 2);
        for (idx, record) in records.iter().enumerate() {
            assert_eq!(record.chunk_index, idx);
        }
        assert_eq!(records[0].title, "Fruit");
        assert_eq!(records[0].content, "apples are red pears are green");
        assert_eq!(records[1].summary, "Orbital facts.");
    }

    #[test]
    fn plain_text_list_agrees_with_records() {
        let store = sample_store();
        let texts = as_plain_text_list(&store);
        let records = as_structured_records(&store);
        for record in &records {
            assert_eq!(texts[record.chunk_index], record.content);
        }
    }

    #[test]
    fn rendering_is_deterministic_and_ordered() {
        let store = sample_store();
        let first = render_human_readable(&store);
        let second = render_human_readable(&store);
        assert_eq!(first, second);

        let chunk0 = first.find("Chunk #0").unwrap();
        let chunk1 = first.find("Chunk #1").unwrap();
        assert!(chunk0 < chunk1);
        assert!(first.contains("Fruit"));
        assert!(first.contains("- pears are green"));
    }

    #[test]
    fn empty_store_renders_empty() {
        let store = ChunkStore::new();
        assert!(as_plain_text_list(&store).is_empty());
        assert!(as_structured_records(&store).is_empty());
        assert!(render_human_readable(&store).is_empty());
    }
}
