//! Crawl ledger: the pending / scraped / failed URL sets
//!
//! A discovered URL belongs to exactly one of the three sets. Discovery only
//! adds to `pending`; fetching only moves entries out of `pending`.

use crate::state::UrlState;
use crate::storage::traits::{LedgerStore, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// On-disk form of the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub pending_urls: Vec<String>,
    #[serde(default)]
    pub scraped_urls: Vec<String>,
    #[serde(default)]
    pub failed_urls: Vec<String>,
}

/// Set sizes derived from a ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerCounts {
    pub pending: usize,
    pub scraped: usize,
    pub failed: usize,
    pub total: usize,
}

/// In-memory ledger with insertion-ordered, pairwise disjoint sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlLedger {
    pending: Vec<String>,
    scraped: Vec<String>,
    failed: Vec<String>,
    states: HashMap<String, UrlState>,
}

impl CrawlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from its snapshot
    ///
    /// A URL listed in more than one set keeps the most advanced state
    /// (scraped, then failed, then pending) so the sets stay disjoint.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let mut ledger = Self::new();
        let mut duplicates = 0usize;

        for (urls, state) in [
            (snapshot.scraped_urls, UrlState::Scraped),
            (snapshot.failed_urls, UrlState::Failed),
            (snapshot.pending_urls, UrlState::Pending),
        ] {
            for url in urls {
                if ledger.states.contains_key(&url) {
                    duplicates += 1;
                    continue;
                }
                ledger.insert(url, state);
            }
        }

        if duplicates > 0 {
            tracing::warn!(
                "Ledger snapshot listed {} URLs in more than one set; kept the most advanced state",
                duplicates
            );
        }

        ledger
    }

    /// Returns the full three-set snapshot
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            pending_urls: self.pending.clone(),
            scraped_urls: self.scraped.clone(),
            failed_urls: self.failed.clone(),
        }
    }

    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        self.states.get(url).copied()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.states.contains_key(url)
    }

    /// Adds every URL not already present in any set to `pending`
    ///
    /// URLs keep their input order, and repeats within the input count once.
    /// Returns how many URLs were newly added.
    pub fn merge_discovered<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for url in urls {
            let url = url.into();
            if !self.states.contains_key(&url) {
                self.insert(url, UrlState::Pending);
                added += 1;
            }
        }
        added
    }

    /// Moves a pending URL to `scraped`
    pub fn mark_scraped(&mut self, url: &str) -> StorageResult<()> {
        self.transition(url, UrlState::Scraped)
    }

    /// Moves a pending URL to `failed`
    pub fn mark_failed(&mut self, url: &str) -> StorageResult<()> {
        self.transition(url, UrlState::Failed)
    }

    /// Moves every failed URL back to the end of `pending` for another attempt
    pub fn requeue_failed(&mut self) -> usize {
        let failed = std::mem::take(&mut self.failed);
        let count = failed.len();
        for url in failed {
            self.states.insert(url.clone(), UrlState::Pending);
            self.pending.push(url);
        }
        count
    }

    /// Pending URLs in discovery order
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn scraped(&self) -> &[String] {
        &self.scraped
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            pending: self.pending.len(),
            scraped: self.scraped.len(),
            failed: self.failed.len(),
            total: self.states.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn insert(&mut self, url: String, state: UrlState) {
        match state {
            UrlState::Pending => self.pending.push(url.clone()),
            UrlState::Scraped => self.scraped.push(url.clone()),
            UrlState::Failed => self.failed.push(url.clone()),
        }
        self.states.insert(url, state);
    }

    fn transition(&mut self, url: &str, to: UrlState) -> StorageResult<()> {
        let current = self.state_of(url);
        if current != Some(UrlState::Pending) {
            return Err(StorageError::NotPending {
                url: url.to_string(),
                state: current,
            });
        }

        if let Some(pos) = self.pending.iter().position(|u| u == url) {
            let url = self.pending.remove(pos);
            self.insert(url, to);
        }
        Ok(())
    }
}

/// The single writer of a durable ledger
///
/// Every mutation is followed by a full snapshot save, so a reader of the
/// store always sees the state as of the last completed transition.
pub struct LedgerWriter {
    ledger: CrawlLedger,
    store: Arc<dyn LedgerStore>,
}

impl LedgerWriter {
    /// Opens the ledger for a run
    ///
    /// With `resume` the persisted ledger is loaded. Without it the durable
    /// state is cleared first and the run starts from an empty ledger.
    pub fn open(store: Arc<dyn LedgerStore>, resume: bool) -> StorageResult<Self> {
        let ledger = if resume {
            let ledger = store.load();
            let counts = ledger.counts();
            tracing::info!(
                "Resuming ledger: {} pending, {} scraped, {} failed",
                counts.pending,
                counts.scraped,
                counts.failed
            );
            ledger
        } else {
            tracing::info!("Starting with an empty ledger");
            store.clear()?;
            let ledger = CrawlLedger::new();
            store.save(&ledger)?;
            ledger
        };

        Ok(Self { ledger, store })
    }

    pub fn ledger(&self) -> &CrawlLedger {
        &self.ledger
    }

    /// Merges discovered URLs and persists when anything was added
    pub fn merge_discovered<I, S>(&mut self, urls: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let added = self.ledger.merge_discovered(urls);
        if added > 0 {
            self.store.save(&self.ledger)?;
        }
        Ok(added)
    }

    pub fn mark_scraped(&mut self, url: &str) -> StorageResult<()> {
        self.ledger.mark_scraped(url)?;
        self.store.save(&self.ledger)
    }

    pub fn mark_failed(&mut self, url: &str) -> StorageResult<()> {
        self.ledger.mark_failed(url)?;
        self.store.save(&self.ledger)
    }

    pub fn requeue_failed(&mut self) -> StorageResult<usize> {
        let moved = self.ledger.requeue_failed();
        if moved > 0 {
            self.store.save(&self.ledger)?;
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedgerStore;

    fn assert_disjoint(ledger: &CrawlLedger) {
        for url in ledger.pending() {
            assert!(!ledger.scraped().contains(url), "{} pending and scraped", url);
            assert!(!ledger.failed().contains(url), "{} pending and failed", url);
        }
        for url in ledger.scraped() {
            assert!(!ledger.failed().contains(url), "{} scraped and failed", url);
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut ledger = CrawlLedger::new();
        assert_eq!(ledger.merge_discovered(["a", "b", "c"]), 3);
        let after_first = ledger.clone();

        assert_eq!(ledger.merge_discovered(["a", "b", "c"]), 0);
        assert_eq!(ledger, after_first);
    }

    #[test]
    fn test_merge_keeps_page_order_and_dedups_within_batch() {
        let mut ledger = CrawlLedger::new();
        assert_eq!(ledger.merge_discovered(["x", "y", "x"]), 2);
        assert_eq!(ledger.merge_discovered(["y", "z"]), 1);
        assert_eq!(ledger.pending(), &["x", "y", "z"]);
    }

    #[test]
    fn test_failed_url_never_rediscovered() {
        let mut ledger = CrawlLedger::new();
        ledger.merge_discovered(["a", "b"]);
        ledger.mark_failed("a").unwrap();
        ledger.mark_scraped("b").unwrap();

        assert_eq!(ledger.merge_discovered(["a", "b", "c"]), 1);
        assert_eq!(ledger.state_of("a"), Some(UrlState::Failed));
        assert_eq!(ledger.state_of("b"), Some(UrlState::Scraped));
        assert_eq!(ledger.pending(), &["c"]);
        assert_disjoint(&ledger);
    }

    #[test]
    fn test_transitions_keep_sets_disjoint() {
        let mut ledger = CrawlLedger::new();
        let urls: Vec<String> = (0..20).map(|i| format!("https://t.example/{}", i)).collect();
        ledger.merge_discovered(urls.iter().cloned());
        assert_disjoint(&ledger);

        for (i, url) in urls.iter().enumerate() {
            if i % 3 == 0 {
                ledger.mark_failed(url).unwrap();
            } else if i % 3 == 1 {
                ledger.mark_scraped(url).unwrap();
            }
            ledger.merge_discovered(urls.iter().take(i + 2).cloned());
            assert_disjoint(&ledger);
        }

        let counts = ledger.counts();
        assert_eq!(counts.total, 20);
        assert_eq!(counts.pending + counts.scraped + counts.failed, 20);
    }

    #[test]
    fn test_mark_requires_pending() {
        let mut ledger = CrawlLedger::new();
        assert!(matches!(
            ledger.mark_scraped("unknown"),
            Err(StorageError::NotPending { state: None, .. })
        ));

        ledger.merge_discovered(["a"]);
        ledger.mark_scraped("a").unwrap();
        assert!(matches!(
            ledger.mark_failed("a"),
            Err(StorageError::NotPending {
                state: Some(UrlState::Scraped),
                ..
            })
        ));
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_order() {
        let mut ledger = CrawlLedger::new();
        ledger.merge_discovered(["c", "a", "b", "d"]);
        ledger.mark_scraped("a").unwrap();
        ledger.mark_failed("d").unwrap();

        let restored = CrawlLedger::from_snapshot(ledger.snapshot());
        assert_eq!(restored, ledger);
        assert_eq!(restored.pending(), &["c", "b"]);
    }

    #[test]
    fn test_overlapping_snapshot_is_made_disjoint() {
        let snapshot = LedgerSnapshot {
            pending_urls: vec!["a".into(), "b".into(), "c".into()],
            scraped_urls: vec!["a".into()],
            failed_urls: vec!["b".into(), "a".into()],
        };
        let ledger = CrawlLedger::from_snapshot(snapshot);

        assert_eq!(ledger.state_of("a"), Some(UrlState::Scraped));
        assert_eq!(ledger.state_of("b"), Some(UrlState::Failed));
        assert_eq!(ledger.pending(), &["c"]);
        assert_disjoint(&ledger);
    }

    #[test]
    fn test_requeue_failed() {
        let mut ledger = CrawlLedger::new();
        ledger.merge_discovered(["a", "b"]);
        ledger.mark_failed("a").unwrap();

        assert_eq!(ledger.requeue_failed(), 1);
        assert_eq!(ledger.pending(), &["b", "a"]);
        assert!(ledger.failed().is_empty());
    }

    #[test]
    fn test_writer_persists_every_mutation() {
        let store = Arc::new(MemoryLedgerStore::default());
        let mut writer = LedgerWriter::open(store.clone(), true).unwrap();

        writer.merge_discovered(["a", "b"]).unwrap();
        assert_eq!(store.load().pending(), &["a", "b"]);

        writer.mark_scraped("a").unwrap();
        assert_eq!(store.load().scraped(), &["a"]);

        writer.mark_failed("b").unwrap();
        assert_eq!(store.load().failed(), &["b"]);
        assert_eq!(store.load(), *writer.ledger());
    }

    #[test]
    fn test_writer_fresh_open_clears_existing_state() {
        let store = Arc::new(MemoryLedgerStore::default());
        let mut seeded = CrawlLedger::new();
        seeded.merge_discovered(["old"]);
        store.save(&seeded).unwrap();

        let writer = LedgerWriter::open(store.clone(), false).unwrap();
        assert!(writer.ledger().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_writer_resume_loads_existing_state() {
        let store = Arc::new(MemoryLedgerStore::default());
        let mut seeded = CrawlLedger::new();
        seeded.merge_discovered(["a", "b"]);
        seeded.mark_scraped("a").unwrap();
        store.save(&seeded).unwrap();

        let writer = LedgerWriter::open(store, true).unwrap();
        assert_eq!(writer.ledger(), &seeded);
    }
}
