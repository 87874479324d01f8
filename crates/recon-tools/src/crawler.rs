//! Headless-crawler state machine, reimplemented as a pure, browser-free
//! walk over a [`PageSnapshot`] abstraction. Grounded on
//! `playwright_scanner.py`'s `State`/`Action`/`PlaywrightScanner`: the
//! three-set dedup (fingerprint, semantic key, action-sequence key) and the
//! depth/path-length bounds are carried over unchanged; only the DOM access
//! itself is abstracted behind a trait instead of hard-wired to a browser.

use std::collections::BTreeMap;
use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// A single interactive element discovered on a page: a button, link, or
/// submit input. `cluster_key` groups semantically-similar actions so the
/// crawler doesn't re-execute near-duplicates (e.g. every row's "delete"
/// button).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Action {
    pub selector: String,
    pub text: String,
    pub tag: String,
    pub semantic: String,
}

impl Action {
    pub fn cluster_key(&self) -> String {
        let words: Vec<&str> = self
            .text
            .to_lowercase()
            .split_whitespace()
            .take(3)
            .collect();
        format!("{}:{}:{}", self.semantic, self.tag, words.join("_"))
    }
}

/// What the crawler needs from a live page, independent of how it's driven
/// (a real browser, a headless render service, a test double).
pub trait PageSnapshot {
    fn url(&self) -> String;
    /// Counts of structurally-relevant DOM features: tag name / feature
    /// name -> count (e.g. `"forms"`, `"buttons"`, `"links"`, `"input"`).
    fn dom_vector(&self) -> BTreeMap<String, u32>;
    fn cookies_hash(&self) -> String;
    fn storage_hash(&self) -> String;
    fn actions(&self, limit: usize) -> Vec<Action>;
}

/// One node in the crawl: a page plus the path of actions that reached it.
#[derive(Debug, Clone)]
pub struct CrawlState {
    pub url: String,
    pub dom_vector: BTreeMap<String, u32>,
    pub cookies_hash: String,
    pub storage_hash: String,
    pub depth: u32,
    pub path: Vec<Action>,
    pub actions: Vec<Action>,
}

impl CrawlState {
    fn dom_hash(&self) -> String {
        let serialized = serde_json::to_string(&self.dom_vector).unwrap_or_default();
        hex::encode(Sha256::digest(serialized.as_bytes()))[..16].to_string()
    }

    /// `(normalized_url, sorted_query_keys, cookies_hash, storage_hash,
    /// dom_hash, action_signature)` — collapses pages that look identical
    /// in every dimension the crawler cares about.
    fn fingerprint(&self) -> (String, Vec<String>, String, String, String, u64) {
        let (base, query) = split_query(&self.url);
        let mut query_keys: Vec<String> = query
            .map(|q| q.split('&').filter_map(|p| p.split('=').next()).map(str::to_string).collect())
            .unwrap_or_default();
        query_keys.sort();
        query_keys.dedup();

        let mut cluster_keys: Vec<String> = self.actions.iter().map(Action::cluster_key).collect();
        cluster_keys.sort();
        cluster_keys.dedup();
        let action_signature = hash_u64(&cluster_keys.join(","));

        (base, query_keys, self.cookies_hash.clone(), self.storage_hash.clone(), self.dom_hash(), action_signature)
    }

    /// `normalized_url:forms:buttons:links` — coarser than the full
    /// fingerprint, catching pages that differ only in irrelevant DOM
    /// churn.
    fn semantic_key(&self) -> String {
        let (base, _) = split_query(&self.url);
        format!(
            "{}:{}:{}:{}",
            base,
            self.dom_vector.get("forms").copied().unwrap_or(0),
            self.dom_vector.get("buttons").copied().unwrap_or(0),
            self.dom_vector.get("links").copied().unwrap_or(0)
        )
    }

    fn action_sequence_key(&self) -> String {
        self.path.iter().map(Action::cluster_key).collect::<Vec<_>>().join(":")
    }
}

fn split_query(url: &str) -> (String, Option<&str>) {
    match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    }
}

fn hash_u64(s: &str) -> u64 {
    let digest = Sha256::digest(s.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("8 bytes"))
}

/// Bounds and dedup sets for a single crawl run.
pub struct Crawler {
    max_depth: u32,
    max_actions_per_state: usize,
    max_path_length: usize,
    visited_fingerprints: HashSet<(String, Vec<String>, String, String, String, u64)>,
    semantic_states: HashSet<String>,
    visited_sequences: HashSet<String>,
    discovered_endpoints: HashSet<String>,
}

impl Crawler {
    pub fn new(max_depth: u32, max_actions_per_state: usize, max_path_length: usize) -> Self {
        Self {
            max_depth,
            max_actions_per_state,
            max_path_length,
            visited_fingerprints: HashSet::new(),
            semantic_states: HashSet::new(),
            visited_sequences: HashSet::new(),
            discovered_endpoints: HashSet::new(),
        }
    }

    pub fn discovered_endpoints(&self) -> &HashSet<String> {
        &self.discovered_endpoints
    }

    fn should_skip(&self, state: &CrawlState) -> bool {
        if state.depth > self.max_depth || state.path.len() > self.max_path_length {
            return true;
        }
        self.visited_fingerprints.contains(&state.fingerprint())
            || self.semantic_states.contains(&state.semantic_key())
            || self.visited_sequences.contains(&state.action_sequence_key())
    }

    /// Marks `state` visited across all three dedup sets and records its
    /// URL as a discovered endpoint.
    pub fn visit(&mut self, state: &CrawlState) -> bool {
        if self.should_skip(state) {
            return false;
        }
        self.visited_fingerprints.insert(state.fingerprint());
        self.semantic_states.insert(state.semantic_key());
        self.visited_sequences.insert(state.action_sequence_key());
        self.discovered_endpoints.insert(state.url.clone());
        true
    }

    /// Build the initial state from a freshly-loaded page.
    pub fn initial_state(&self, page: &dyn PageSnapshot) -> CrawlState {
        CrawlState {
            url: page.url(),
            dom_vector: page.dom_vector(),
            cookies_hash: page.cookies_hash(),
            storage_hash: page.storage_hash(),
            depth: 0,
            path: Vec::new(),
            actions: page.actions(self.max_actions_per_state),
        }
    }

    /// Build the state reached by executing `action` from `from`, using the
    /// page snapshot taken after the action ran.
    pub fn next_state(&self, from: &CrawlState, action: Action, page: &dyn PageSnapshot) -> CrawlState {
        let mut path = from.path.clone();
        path.push(action);
        CrawlState {
            url: page.url(),
            dom_vector: page.dom_vector(),
            cookies_hash: page.cookies_hash(),
            storage_hash: page.storage_hash(),
            depth: from.depth + 1,
            path,
            actions: page.actions(self.max_actions_per_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(semantic: &str, text: &str) -> Action {
        Action {
            selector: format!("button#{semantic}"),
            text: text.to_string(),
            tag: "button".to_string(),
            semantic: semantic.to_string(),
        }
    }

    fn state(url: &str, depth: u32, path: Vec<Action>) -> CrawlState {
        let mut dom_vector = BTreeMap::new();
        dom_vector.insert("forms".to_string(), 1);
        dom_vector.insert("buttons".to_string(), 2);
        dom_vector.insert("links".to_string(), 3);
        CrawlState {
            url: url.to_string(),
            dom_vector,
            cookies_hash: "c1".to_string(),
            storage_hash: "s1".to_string(),
            depth,
            path,
            actions: vec![action("nav", "Next")],
        }
    }

    #[test]
    fn first_visit_succeeds_revisit_is_skipped() {
        let mut crawler = Crawler::new(2, 20, 10);
        let s = state("https://example.com/page", 0, vec![]);
        assert!(crawler.visit(&s));
        assert!(!crawler.visit(&s));
    }

    #[test]
    fn depth_beyond_max_is_skipped() {
        let mut crawler = Crawler::new(1, 20, 10);
        let s = state("https://example.com/deep", 5, vec![]);
        assert!(!crawler.visit(&s));
    }

    #[test]
    fn semantic_key_collapses_dom_noise() {
        let mut crawler = Crawler::new(2, 20, 10);
        let a = state("https://example.com/x?nonce=1", 0, vec![]);
        let b = state("https://example.com/x?nonce=2", 0, vec![]);
        assert!(crawler.visit(&a));
        // Same base path + same forms/buttons/links counts -> same semantic key.
        assert!(!crawler.visit(&b));
    }

    #[test]
    fn action_cluster_key_groups_by_first_three_words() {
        let a1 = action("destructive", "Delete this item now");
        let a2 = action("destructive", "Delete this item forever");
        assert_eq!(a1.cluster_key(), a2.cluster_key());
    }
}
