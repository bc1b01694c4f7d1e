//! Allowed / rejected origin counters for observability.
//!
//! Not part of the decision path: callers record explicitly after deciding.
//! Totals are atomics; per-origin counters live in a bounded `DashMap` so a flood of
//! distinct hostile origins cannot grow memory without limit.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

pub const DEFAULT_MAX_TRACKED_ORIGINS: usize = 1024;

#[derive(Debug)]
struct OriginCounters {
    allowed: AtomicU64,
    rejected: AtomicU64,
    last_seen: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RejectionRecorder {
    allowed_total: AtomicU64,
    rejected_total: AtomicU64,
    untracked_total: AtomicU64,
    origins: DashMap<String, OriginCounters>,
    max_tracked: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OriginStats {
    pub origin: String,
    pub allowed: u64,
    pub rejected: u64,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecorderSnapshot {
    pub allowed_total: u64,
    pub rejected_total: u64,
    pub untracked_total: u64,
    pub origins: Vec<OriginStats>,
}

impl Default for RejectionRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRACKED_ORIGINS)
    }
}

impl RejectionRecorder {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            allowed_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            untracked_total: AtomicU64::new(0),
            origins: DashMap::new(),
            max_tracked,
        }
    }

    pub fn record(&self, origin: &str, allowed: bool) {
        let total = if allowed {
            &self.allowed_total
        } else {
            &self.rejected_total
        };
        total.fetch_add(1, Ordering::Relaxed);

        if let Some(mut entry) = self.origins.get_mut(origin) {
            entry.bump(allowed);
            return;
        }

        // Racing inserts may overshoot the bound by a few entries; acceptable for stats.
        if self.origins.len() >= self.max_tracked {
            self.untracked_total.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.origins
            .entry(origin.to_string())
            .or_insert_with(|| OriginCounters {
                allowed: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                last_seen: Utc::now(),
            })
            .bump(allowed);
    }

    pub fn allowed_total(&self) -> u64 {
        self.allowed_total.load(Ordering::Relaxed)
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        let mut origins: Vec<OriginStats> = self
            .origins
            .iter()
            .map(|entry| OriginStats {
                origin: entry.key().clone(),
                allowed: entry.allowed.load(Ordering::Relaxed),
                rejected: entry.rejected.load(Ordering::Relaxed),
                last_seen: entry.last_seen,
            })
            .collect();
        origins.sort_by(|a, b| a.origin.cmp(&b.origin));

        RecorderSnapshot {
            allowed_total: self.allowed_total(),
            rejected_total: self.rejected_total(),
            untracked_total: self.untracked_total.load(Ordering::Relaxed),
            origins,
        }
    }
}

impl OriginCounters {
    fn bump(&mut self, allowed: bool) {
        let counter = if allowed {
            &self.allowed
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.last_seen = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn counts_per_origin_and_totals() {
        let recorder = RejectionRecorder::default();
        recorder.record("https://a.example", true);
        recorder.record("https://a.example", true);
        recorder.record("https://b.example", false);

        let snap = recorder.snapshot();
        assert_eq!(snap.allowed_total, 2);
        assert_eq!(snap.rejected_total, 1);
        assert_eq!(snap.origins.len(), 2);
        assert_eq!(snap.origins[0].origin, "https://a.example");
        assert_eq!(snap.origins[0].allowed, 2);
        assert_eq!(snap.origins[1].rejected, 1);
    }

    #[test]
    fn bounded_map_only_updates_totals_when_full() {
        let recorder = RejectionRecorder::new(2);
        for i in 0..5 {
            recorder.record(&format!("https://{i}.evil.example"), false);
        }
        recorder.record("https://0.evil.example", false);

        let snap = recorder.snapshot();
        assert_eq!(snap.rejected_total, 6);
        assert_eq!(snap.origins.len(), 2);
        assert_eq!(snap.untracked_total, 3);
        assert_eq!(snap.origins[0].rejected, 2);
    }

    #[test]
    fn concurrent_recording_is_lossless() {
        let recorder = Arc::new(RejectionRecorder::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        recorder.record("https://shared.example", t % 2 == 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = recorder.snapshot();
        assert_eq!(snap.allowed_total + snap.rejected_total, 8000);
        assert_eq!(snap.origins[0].allowed, 4000);
        assert_eq!(snap.origins[0].rejected, 4000);
    }
}
