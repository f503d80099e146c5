//! Keyword Context Retriever
//!
//! Ranks in-memory snippets by how many query terms they share. Snippets can
//! be added directly or loaded from `.txt`/`.md` files, which are split into
//! paragraphs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use crate::domain::interview::Role;
use crate::ports::ContextRetriever;

const MIN_TERM_LEN: usize = 3;
const DEFAULT_TOP_K: usize = 2;

/// A piece of background knowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub source: String,
    /// Restricts the snippet to one role; `None` matches every role.
    pub role: Option<Role>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct KeywordContextRetriever {
    snippets: Vec<(Snippet, HashSet<String>)>,
    top_k: usize,
}

impl Default for KeywordContextRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordContextRetriever {
    pub fn new() -> Self {
        Self {
            snippets: Vec::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.add(snippet);
        self
    }

    pub fn add(&mut self, snippet: Snippet) {
        let terms = terms(&snippet.text);
        self.snippets.push((snippet, terms));
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Loads every `.txt` and `.md` file in `dir` (not recursive).
    ///
    /// Unreadable files are skipped with a warning. Returns the number of
    /// snippets added.
    pub async fn load_dir(&mut self, dir: &Path) -> std::io::Result<usize> {
        let mut entries = fs::read_dir(dir).await?;
        let mut added = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let supported = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            );
            if !supported {
                continue;
            }
            let text = match fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping knowledge file");
                    continue;
                }
            };
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
                self.add(Snippet {
                    source: source.clone(),
                    role: None,
                    text: paragraph.to_string(),
                });
                added += 1;
            }
        }
        tracing::info!(dir = %dir.display(), snippets = added, "knowledge snippets loaded");
        Ok(added)
    }

    fn rank(&self, role: Option<Role>, query: &str) -> Vec<&Snippet> {
        let query_terms = terms(query);
        let mut scored: Vec<(usize, usize, &Snippet)> = self
            .snippets
            .iter()
            .enumerate()
            .filter(|(_, (snippet, _))| snippet.role.is_none() || snippet.role == role)
            .map(|(index, (snippet, snippet_terms))| {
                (query_terms.intersection(snippet_terms).count(), index, snippet)
            })
            .filter(|(score, _, _)| *score > 0)
            .collect();
        // Highest overlap first, insertion order breaks ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, _, snippet)| snippet)
            .collect()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl ContextRetriever for KeywordContextRetriever {
    async fn lookup(&self, role: Option<Role>, query: &str) -> Option<String> {
        let ranked = self.rank(role, query);
        if ranked.is_empty() {
            return None;
        }
        Some(
            ranked
                .iter()
                .map(|snippet| snippet.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    }
}
