//! Per-document outcome of a multi-document save.
//!
//! A save fans out one write per document. Instead of a single pass/fail
//! flag, every document is reported as saved, failed (with the reason) or
//! skipped, so the operator can retry only what failed.

use std::fmt;

/// A write that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite<K> {
    /// Key of the document that failed
    pub key: K,
    /// Operator-facing reason
    pub reason: String,
}

/// Result of saving a batch of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport<K> {
    /// Documents persisted successfully
    pub saved: Vec<K>,
    /// Documents whose write failed; they stay pending
    pub failed: Vec<FailedWrite<K>>,
    /// Dirty documents left out of the batch because there was nothing to write
    pub skipped: Vec<K>,
}

impl<K> Default for SaveReport<K> {
    fn default() -> Self {
        Self {
            saved: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<K> SaveReport<K> {
    /// True when no write failed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when nothing was written, failed or skipped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Number of documents the batch attempted to write
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

impl<K: fmt::Display> SaveReport<K> {
    /// One-line summary for a notice, naming failed documents.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No changes to save.".to_string();
        }
        if self.failed.is_empty() {
            return format!("Saved {} record(s).", self.saved.len());
        }
        let failed: Vec<String> = self
            .failed
            .iter()
            .map(|failure| format!("{} ({})", failure.key, failure.reason))
            .collect();
        format!(
            "Saved {} of {} record(s). Failed: {}",
            self.saved.len(),
            self.attempted(),
            failed.join(", ")
        )
    }
}
