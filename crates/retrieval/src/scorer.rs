//! Keyword relevance scorer.
//!
//! Scoring for a normalized (lowercased, trimmed) query:
//!
//! | signal                                                   | points |
//! |----------------------------------------------------------|--------|
//! | keyword is a substring of the query                      | 3      |
//! | (query word, keyword) pair, either contains the other    | 1      |
//! | lowercased title is a substring of the query             | 4      |
//! | title word equal to a query word                         | 2      |
//!
//! Query words shorter than two UTF-16 code units are dropped, but the
//! substring checks still run against the full query. Keywords are matched
//! as given; [`DocumentStore`](supportdesk_core::docs::DocumentStore)
//! lowercases them on load. Documents scoring zero are
//! discarded; the rest are sorted by descending score with a stable sort,
//! so ties keep catalog order.

use supportdesk_core::docs::DocEntry;
use tracing::trace;

/// Points awarded per signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub keyword: u32,
    pub word_overlap: u32,
    pub title: u32,
    pub title_word: u32,
}

impl ScoringWeights {
    /// The variant without the title-word bonus.
    pub fn without_title_words() -> Self {
        Self {
            title_word: 0,
            ..Self::default()
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: 3,
            word_overlap: 1,
            title: 4,
            title_word: 2,
        }
    }
}

/// A document paired with its score for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredDoc<'a> {
    pub doc: &'a DocEntry,
    pub score: u32,
}

/// Ranks documents against a free-text query. Holds no state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
    top_k: usize,
}

impl RelevanceScorer {
    pub fn new(top_k: usize) -> Self {
        Self {
            weights: ScoringWeights::default(),
            top_k,
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Score every document, zero scores included, in catalog order.
    pub fn score_all<'a>(&self, query: &str, docs: &'a [DocEntry]) -> Vec<ScoredDoc<'a>> {
        let normalized = query.to_lowercase();
        let normalized = normalized.trim();
        let words: Vec<&str> = normalized
            .split_whitespace()
            .filter(|w| w.encode_utf16().count() > 1)
            .collect();

        docs.iter()
            .map(|doc| ScoredDoc {
                doc,
                score: self.score_doc(normalized, &words, doc),
            })
            .collect()
    }

    /// The top-K documents with a positive score, best first.
    pub fn rank<'a>(&self, query: &str, docs: &'a [DocEntry]) -> Vec<ScoredDoc<'a>> {
        let mut scored: Vec<ScoredDoc<'a>> = self
            .score_all(query, docs)
            .into_iter()
            .filter(|s| s.score > 0)
            .collect();

        // `sort_by` is stable: equal scores keep catalog order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.top_k);

        trace!(
            matches = scored.len(),
            top = ?scored.first().map(|s| (&s.doc.title, s.score)),
            "Scored query"
        );
        scored
    }

    /// The top-K matching documents, best first.
    pub fn score<'a>(&self, query: &str, docs: &'a [DocEntry]) -> Vec<&'a DocEntry> {
        self.rank(query, docs).into_iter().map(|s| s.doc).collect()
    }

    fn score_doc(&self, query: &str, words: &[&str], doc: &DocEntry) -> u32 {
        let w = self.weights;
        let mut score = 0;

        for keyword in &doc.keywords {
            if query.contains(keyword.as_str()) {
                score += w.keyword;
            }

            for word in words {
                if keyword.contains(word) || word.contains(keyword.as_str()) {
                    score += w.word_overlap;
                }
            }
        }

        let title = doc.title.to_lowercase();
        if query.contains(title.as_str()) {
            score += w.title;
        }

        for title_word in title.split_whitespace() {
            if words.contains(&title_word) {
                score += w.title_word;
            }
        }

        score
    }
}

/// Rank `docs` for `query` with the default weights.
pub fn score<'a>(query: &str, docs: &'a [DocEntry], top_k: usize) -> Vec<&'a DocEntry> {
    RelevanceScorer::new(top_k).score(query, docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin_catalog, product_docs};
    use supportdesk_core::docs::DocumentStore;

    fn titles(docs: &[&DocEntry]) -> Vec<String> {
        docs.iter().map(|d| d.title.clone()).collect()
    }

    fn score_of(query: &str, docs: &[DocEntry], title: &str) -> u32 {
        RelevanceScorer::new(docs.len())
            .score_all(query, docs)
            .into_iter()
            .find(|s| s.doc.title == title)
            .map(|s| s.score)
            .unwrap()
    }

    #[test]
    fn refund_query_ranks_refund_policy_first() {
        let store = product_docs();
        let result = score("What is the refund policy?", store.docs(), 3);
        assert_eq!(result[0].title, "Refund Policy");
        assert!(score_of("What is the refund policy?", store.docs(), "Refund Policy") >= 3);
    }

    #[test]
    fn refund_policy_breakdown() {
        // keyword "refund" (3) + word/keyword "refund" (1)
        // + title substring (4) + title word "refund" (2)
        let store = product_docs();
        assert_eq!(
            score_of("What is the refund policy?", store.docs(), "Refund Policy"),
            10
        );
    }

    #[test]
    fn unrelated_query_returns_nothing() {
        let store = builtin_catalog(true);
        assert!(score("xyzzy plugh", store.docs(), 3).is_empty());
    }

    #[test]
    fn empty_query_returns_nothing() {
        let store = builtin_catalog(true);
        assert!(score("", store.docs(), 3).is_empty());
        assert!(score("   \t\n", store.docs(), 3).is_empty());
    }

    #[test]
    fn never_more_than_top_k() {
        let store = builtin_catalog(true);
        for top_k in 0..5 {
            let result = score("settings email password billing support", store.docs(), top_k);
            assert!(result.len() <= top_k);
        }
    }

    #[test]
    fn results_sorted_descending() {
        let store = builtin_catalog(true);
        let ranked = RelevanceScorer::new(10).rank("email settings help", store.docs());
        assert!(ranked.len() > 1);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn ties_keep_catalog_order() {
        let docs = vec![
            DocEntry::new("Alpha", "a", ["shared"]),
            DocEntry::new("Beta", "b", ["shared"]),
            DocEntry::new("Gamma", "c", ["shared"]),
        ];
        let result = score("shared", &docs, 3);
        assert_eq!(titles(&result), vec!["Alpha", "Beta", "Gamma"]);

        let reversed: Vec<DocEntry> = docs.into_iter().rev().collect();
        let result = score("shared", &reversed, 2);
        assert_eq!(titles(&result), vec!["Gamma", "Beta"]);
    }

    #[test]
    fn title_substring_bonus() {
        let docs = vec![DocEntry::new("Contact Support", "c", Vec::<String>::new())];
        // title substring (4) + two title words (2 + 2)
        assert_eq!(score_of("how do i contact support", &docs, "Contact Support"), 8);

        let no_title_words = RelevanceScorer::new(1)
            .with_weights(ScoringWeights::without_title_words())
            .score_all("how do i contact support", &docs);
        assert_eq!(no_title_words[0].score, 4);
    }

    #[test]
    fn single_character_words_still_get_substring_checks() {
        let docs = vec![DocEntry::new("Letters", "x", ["a b"])];
        // every word is one character long, so only the full-query check fires
        assert_eq!(score_of("a b", &docs, "Letters"), 3);
    }

    #[test]
    fn keyword_inside_word_and_word_inside_keyword() {
        let docs = vec![DocEntry::new("Doc", "x", ["pass", "forgot password"])];
        // both keywords are substrings of the query (3 + 3),
        // "passwords" contains "pass" (1), "forgot password" contains "forgot" (1)
        assert_eq!(score_of("forgot passwords", &docs, "Doc"), 8);
    }

    #[test]
    fn uppercase_keywords_are_normalized_on_load() {
        let store = DocumentStore::new(vec![DocEntry::new("Doc", "x", ["Refund"])]).unwrap();
        assert_eq!(score_of("REFUND please", store.docs(), "Doc"), 4);
    }

    #[test]
    fn raw_keywords_are_matched_as_given() {
        let docs = vec![DocEntry::new("Doc", "x", ["Refund"])];
        assert_eq!(score_of("REFUND please", &docs, "Doc"), 0);
    }

    #[test]
    fn word_length_counts_utf16_units() {
        // one char, two UTF-16 units: kept as a query word
        let docs = vec![DocEntry::new("Doc", "x", ["🦀 crab"])];
        assert_eq!(score_of("🦀", &docs, "Doc"), 1);
    }

    #[test]
    fn unicode_queries_do_not_panic() {
        let store = builtin_catalog(true);
        for q in ["ÜBER straße", "日本語 の 質問", "🦀🦀 refund", "İstanbul", "\u{0301}e"] {
            let _ = score(q, store.docs(), 3);
        }
        let docs = vec![DocEntry::new("Café", "x", ["crème brûlée"])];
        assert_eq!(score_of("CAFÉ", &docs, "Café"), 4 + 2);
    }

    #[test]
    fn scoring_is_idempotent() {
        let store = builtin_catalog(true);
        let scorer = RelevanceScorer::new(3);
        let a = titles(&scorer.score("how do I reset my password", store.docs()));
        let b = titles(&scorer.score("how do I reset my password", store.docs()));
        assert_eq!(a, b);
        assert_eq!(a[0], "Reset Password");
    }

    #[test]
    fn score_all_keeps_zero_scores() {
        let store = product_docs();
        let all = RelevanceScorer::new(1).score_all("xyzzy", store.docs());
        assert_eq!(all.len(), store.len());
        assert!(all.iter().all(|s| s.score == 0));
    }
}
