//! The static documentation set the assistant answers from.
//!
//! Loaded once at startup and never mutated afterwards; share it as
//! `Arc<DocumentStore>`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One documentation entry. Identity is the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntry {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl DocEntry {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// An immutable, ordered list of [`DocEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    docs: Vec<DocEntry>,
}

impl DocumentStore {
    /// Build a store, rejecting duplicate titles.
    ///
    /// Keywords are lowercased and empty ones dropped, so scoring can match
    /// them against a lowercased query as they are.
    pub fn new(mut docs: Vec<DocEntry>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for doc in &docs {
            if !seen.insert(doc.title.as_str()) {
                return Err(format!("duplicate document title: {}", doc.title));
            }
        }
        for doc in &mut docs {
            doc.keywords.retain(|k| !k.is_empty());
            for keyword in &mut doc.keywords {
                *keyword = keyword.to_lowercase();
            }
        }
        Ok(Self { docs })
    }

    /// Parse a JSON array of `{title, content, keywords}` records.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let docs: Vec<DocEntry> =
            serde_json::from_str(json).map_err(|e| format!("invalid document list: {e}"))?;
        Self::new(docs)
    }

    pub fn docs(&self) -> &[DocEntry] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&DocEntry> {
        self.docs.iter().find(|d| d.title == title)
    }
}
