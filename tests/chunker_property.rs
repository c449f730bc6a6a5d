//! Property tests for the chunking invariants.
//!
//! Whatever decision sequence the oracle produces, the engine must neither
//! lose nor duplicate propositions, and chunk indexes must stay gapless and
//! monotone.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use propsmith::{AgenticChunkerService, MockOracle, OracleDecision};

fn block_on<F: std::future::Future<Output = ()>>(fut: F) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(fut);
}

/// Oracle that consumes a scripted list of relative decisions: `None` opens a
/// new chunk, `Some(k)` assigns to the chunk at index `k % store size`.
fn scripted_oracle(decisions: Vec<Option<usize>>) -> MockOracle {
    let script = Arc::new(Mutex::new(VecDeque::from(decisions)));
    MockOracle::with_classify(move |_, outlines| {
        let next = script.lock().unwrap().pop_front().flatten();
        Ok(match next {
            Some(pick) if !outlines.is_empty() => {
                OracleDecision::Assign(outlines[pick % outlines.len()].id)
            }
            _ => OracleDecision::NewChunk,
        })
    })
}

fn proposition_strategy() -> impl Strategy<Value = String> {
    // Mix of meaningful text and whitespace-only entries the engine must skip.
    prop_oneof![
        4 => "[a-zA-Z][a-zA-Z0-9 ]{0,40}",
        1 => " {0,3}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_coverage_and_index_monotonicity(
        propositions in prop::collection::vec(proposition_strategy(), 0..24),
        decisions in prop::collection::vec(prop::option::of(0usize..8), 0..24),
    ) {
        block_on(async move {
            let mut service = AgenticChunkerService::builder()
                .oracle(scripted_oracle(decisions))
                .build();

            let report = service.add_propositions(propositions.clone()).await.unwrap();

            let non_empty: Vec<String> = propositions
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| p.trim().to_string())
                .collect();

            // Coverage: the multiset of stored propositions equals the
            // non-empty input multiset.
            let mut stored: Vec<String> = service
                .store()
                .list_chunks()
                .flat_map(|chunk| chunk.propositions.clone())
                .collect();
            let mut expected = non_empty.clone();
            stored.sort();
            expected.sort();
            assert_eq!(stored, expected, "propositions lost or duplicated");

            assert_eq!(report.processed, non_empty.len());
            assert_eq!(report.skipped_empty, propositions.len() - non_empty.len());

            // Index monotonicity: 0,1,2,… with no gaps or repeats.
            let indexes: Vec<usize> = service
                .store()
                .list_chunks()
                .map(|chunk| chunk.chunk_index)
                .collect();
            let expected_indexes: Vec<usize> = (0..indexes.len()).collect();
            assert_eq!(indexes, expected_indexes);

            // Every chunk carries a label whenever it holds propositions.
            for chunk in service.store().list_chunks() {
                assert!(!chunk.propositions.is_empty());
                assert!(!chunk.title.is_empty());
                assert!(!chunk.summary.is_empty());
            }
        });
    }

    #[test]
    fn prop_summaries_track_current_counts(
        assignments in prop::collection::vec(0usize..4, 1..16),
    ) {
        block_on(async move {
            // Each proposition after the first lands in a scripted existing
            // chunk, so per-chunk counts shift constantly.
            let script: Vec<Option<usize>> = assignments.iter().map(|a| Some(*a)).collect();
            let mut service = AgenticChunkerService::builder()
                .oracle(scripted_oracle(script))
                .build();

            let inputs: Vec<String> = (0..assignments.len())
                .map(|i| format!("statement number {i}"))
                .collect();
            service.add_propositions(inputs).await.unwrap();

            // The counting digest embeds the proposition count; it must match
            // the chunk's actual size after the batch.
            for chunk in service.store().list_chunks() {
                let expected = format!("{} proposition(s)", chunk.propositions.len());
                assert!(
                    chunk.summary.contains(&expected),
                    "summary {:?} does not reflect {} propositions",
                    chunk.summary,
                    chunk.propositions.len()
                );
            }
        });
    }
}
