//! Runtime error log and statistics.
//!
//! Every recovered error is recorded here: counters by severity and
//! category, the last code and timestamp, and a ring of the five most
//! recent reports. Both travel to the peer inside the state snapshot.

use heapless::Deque;
use serde::{Deserialize, Serialize};

use crate::error::{Category, Error, Severity};

pub const RECENT_SLOTS: usize = 5;

/// The recent ring as carried by the state snapshot, oldest first.
pub type RecentReports = [Option<ErrorReport>; RECENT_SLOTS];

/// One recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u16,
    pub severity: Severity,
    pub category: Category,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub total: u32,
    pub by_severity: [u32; Severity::COUNT],
    pub by_category: [u32; Category::COUNT],
    pub last_code: u16,
    pub last_timestamp_ms: u64,
}

impl ErrorStats {
    pub fn count_severity(&self, severity: Severity) -> u32 {
        self.by_severity[severity as usize]
    }

    pub fn count_category(&self, category: Category) -> u32 {
        self.by_category[category as usize]
    }
}

#[derive(Default)]
pub struct ErrorLog {
    stats: ErrorStats,
    recent: Deque<ErrorReport, RECENT_SLOTS>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error`, evicting the oldest recent report when full.
    pub fn record(&mut self, error: &Error, now_ms: u64) -> ErrorReport {
        let report = ErrorReport {
            code: error.code(),
            severity: error.severity(),
            category: error.category(),
            timestamp_ms: now_ms,
        };

        self.stats.total = self.stats.total.saturating_add(1);
        let sev = &mut self.stats.by_severity[report.severity as usize];
        *sev = sev.saturating_add(1);
        let cat = &mut self.stats.by_category[report.category as usize];
        *cat = cat.saturating_add(1);
        self.stats.last_code = report.code;
        self.stats.last_timestamp_ms = now_ms;

        if self.recent.is_full() {
            self.recent.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.recent.push_back(report);
        report
    }

    pub fn stats(&self) -> &ErrorStats {
        &self.stats
    }

    /// Most recent reports, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &ErrorReport> {
        self.recent.iter()
    }

    /// Fixed-size copy of the ring; unused slots trail as `None`.
    pub fn recent_reports(&self) -> RecentReports {
        let mut out = RecentReports::default();
        for (slot, report) in out.iter_mut().zip(self.recent.iter()) {
            *slot = Some(*report);
        }
        out
    }
}
