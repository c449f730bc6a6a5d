//! Splits raw document text into ordered propositions.
//!
//! The splitter walks a separator ladder (paragraphs, then lines, then
//! sentences, then words), greedily merging small pieces up to a character
//! budget and re-splitting oversized pieces with the next separator down.
//! Consecutive propositions share a configurable character overlap so
//! sentence fragments at the boundary keep their context.

use crate::types::Proposition;

/// Recursive-separator text splitter producing chunking-ready propositions.
#[derive(Clone, Debug)]
pub struct PropositionSplitter {
    max_chars: usize,
    overlap_chars: usize,
    separators: Vec<String>,
}

impl Default for PropositionSplitter {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                ". ".to_string(),
                " ".to_string(),
            ],
        }
    }
}

impl PropositionSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum characters per proposition.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Characters carried over from the end of one proposition into the next.
    #[must_use]
    pub fn with_overlap_chars(mut self, overlap_chars: usize) -> Self {
        self.overlap_chars = overlap_chars;
        self
    }

    /// Replace the separator ladder, tried in order. Pieces with none of the
    /// separators are hard-split at the character budget.
    #[must_use]
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Splits text into ordered, trimmed, non-empty proposition strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, &self.separators)
    }

    /// Splits a document and attaches source metadata to each proposition.
    pub fn split_document(
        &self,
        text: &str,
        source: &str,
        doc_type: &str,
    ) -> Vec<Proposition> {
        self.split(text)
            .into_iter()
            .map(|piece| {
                Proposition::new(piece)
                    .with_source(source)
                    .with_doc_type(doc_type)
            })
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let Some(position) = separators
            .iter()
            .position(|sep| text.contains(sep.as_str()))
        else {
            return hard_split(text, self.max_chars);
        };
        let separator = separators[position].as_str();
        let rest = &separators[position + 1..];

        let mut merged: Vec<String> = Vec::new();
        let mut current = String::new();

        for piece in text.split(separator) {
            if piece.trim().is_empty() {
                continue;
            }
            let piece_len = char_len(piece);

            // Oversized piece: flush what we have and descend the ladder.
            if piece_len > self.max_chars {
                if !current.trim().is_empty() {
                    merged.push(current.trim().to_string());
                }
                current = String::new();
                merged.extend(self.split_with(piece, rest));
                continue;
            }

            let sep_len = if current.is_empty() {
                0
            } else {
                char_len(separator)
            };
            if !current.is_empty() && char_len(&current) + sep_len + piece_len > self.max_chars {
                merged.push(current.trim().to_string());
                let tail = overlap_tail(&current, self.overlap_chars);
                // Seed the next proposition with the overlap unless that
                // would immediately overflow it again.
                current = if char_len(&tail) + char_len(separator) + piece_len > self.max_chars {
                    String::new()
                } else {
                    tail
                };
            }
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(piece);
        }

        if !current.trim().is_empty() {
            merged.push(current.trim().to_string());
        }
        merged
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn overlap_tail(text: &str, overlap_chars: usize) -> String {
    if overlap_chars == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(overlap_chars);
    chars[start..].iter().collect::<String>().trim().to_string()
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|window| window.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_stays_whole() {
        let splitter = PropositionSplitter::new();
        let pieces = splitter.split("One short paragraph.\n\nAnother short paragraph.");
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].contains("Another short paragraph."));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let splitter = PropositionSplitter::new();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn pieces_respect_the_character_budget() {
        let splitter = PropositionSplitter::new()
            .with_max_chars(20)
            .with_overlap_chars(0);
        let pieces = splitter.split("aaaa bbbb. cccc dddd. eeee ffff.");
        assert!(pieces.len() >= 2);
        for piece in &pieces {
            assert!(piece.chars().count() <= 20, "oversized piece: {piece:?}");
        }
    }

    #[test]
    fn sentence_content_is_preserved() {
        let splitter = PropositionSplitter::new()
            .with_max_chars(20)
            .with_overlap_chars(0);
        let pieces = splitter.split("aaaa bbbb. cccc dddd. eeee ffff.");
        let joined = pieces.join(" ");
        for word in ["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff"] {
            assert!(joined.contains(word), "missing word {word}");
        }
    }

    #[test]
    fn overlap_carries_context_forward() {
        let splitter = PropositionSplitter::new()
            .with_max_chars(12)
            .with_overlap_chars(4);
        let pieces = splitter.split("abcdef. ghijkl. mnopqr.");
        assert!(pieces.len() >= 2);
        // The second piece starts with the tail of the first.
        let tail: String = pieces[0]
            .chars()
            .skip(pieces[0].chars().count().saturating_sub(4))
            .collect();
        assert!(
            pieces[1].starts_with(tail.trim()),
            "expected {:?} to start with {:?}",
            pieces[1],
            tail
        );
    }

    #[test]
    fn unbroken_text_is_hard_split() {
        let splitter = PropositionSplitter::new()
            .with_max_chars(8)
            .with_overlap_chars(0)
            .with_separators(vec!["\n\n".to_string()]);
        let pieces = splitter.split("abcdefghijklmnopqrstuvwx");
        assert_eq!(pieces, vec!["abcdefgh", "ijklmnop", "qrstuvwx"]);
    }

    #[test]
    fn split_document_attaches_metadata() {
        let splitter = PropositionSplitter::new();
        let props = splitter.split_document("Some content here.", "guide.md", "markdown");
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].source, "guide.md");
        assert_eq!(props[0].doc_type, "markdown");
        assert_eq!(props[0].text, "Some content here.");
    }
}
