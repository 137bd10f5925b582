use std::slice;

use chrono::{DateTime, Utc};
use stockdesk_core::{AlertCounts, AlertSnapshot};

/// Alert-count history of one session, oldest first.
///
/// Callers record at most one snapshot per render; nothing here deduplicates.
#[derive(Debug, Clone, Default)]
pub struct TrendRecorder {
    snapshots: Vec<AlertSnapshot>,
}

impl TrendRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_snapshot(&mut self, counts: AlertCounts, now: DateTime<Utc>) {
        self.snapshots.push(AlertSnapshot {
            recorded_at: now,
            counts,
        });
    }

    /// Iterates the snapshots in insertion order. The iterator can be cloned to
    /// walk the trend again.
    pub fn trend(&self) -> Trend<'_> {
        Trend {
            inner: self.snapshots.iter(),
        }
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Trend<'a> {
    inner: slice::Iter<'a, AlertSnapshot>,
}

impl<'a> Iterator for Trend<'a> {
    type Item = &'a AlertSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Trend<'_> {}
