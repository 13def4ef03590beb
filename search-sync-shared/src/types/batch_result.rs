//! Counters and per-record outcomes produced by sync runs.

use serde::{Deserialize, Serialize};

/// Outcome of indexing a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOutcome {
    /// The document was written; `attempts` counts upsert calls including the successful one.
    Indexed { attempts: u32 },
    /// The record is not eligible, so nothing was written.
    Ineligible,
    /// Every attempt failed; `reason` is the last cause.
    Failed { attempts: u32, reason: String },
}

impl IndexOutcome {
    /// Whether the document is now in the index.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }
}

/// Counters for one batch reindex or retry pass.
///
/// Every run returns its own value; counters are never shared between runs.
/// `total_scanned == total_indexed + total_skipped + total_failed` holds for
/// every value produced through [`BatchRunResult::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRunResult {
    pub total_scanned: u64,
    pub total_indexed: u64,
    pub total_skipped: u64,
    pub total_failed: u64,
    /// Offset to resume from if a rebuild stopped before the last page.
    /// Always 0 for retry passes, which have no resumable position.
    pub next_offset: u64,
    /// The run stopped early on a shutdown signal.
    pub cancelled: bool,
}

impl BatchRunResult {
    /// Start a run at the given offset.
    pub fn starting_at(offset: u64) -> Self {
        Self {
            next_offset: offset,
            ..Self::default()
        }
    }

    /// Count one scanned record by its outcome.
    pub fn record(&mut self, outcome: &IndexOutcome) {
        self.total_scanned += 1;
        match outcome {
            IndexOutcome::Indexed { .. } => self.total_indexed += 1,
            IndexOutcome::Ineligible => self.total_skipped += 1,
            IndexOutcome::Failed { .. } => self.total_failed += 1,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.total_scanned == self.total_indexed + self.total_skipped + self.total_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_counts_balanced() {
        let mut result = BatchRunResult::starting_at(200);
        result.record(&IndexOutcome::Indexed { attempts: 1 });
        result.record(&IndexOutcome::Indexed { attempts: 2 });
        result.record(&IndexOutcome::Ineligible);
        result.record(&IndexOutcome::Failed {
            attempts: 3,
            reason: "timeout".to_string(),
        });

        assert_eq!(result.total_scanned, 4);
        assert_eq!(result.total_indexed, 2);
        assert_eq!(result.total_skipped, 1);
        assert_eq!(result.total_failed, 1);
        assert_eq!(result.next_offset, 200);
        assert!(result.is_balanced());
    }

    #[test]
    fn test_outcome_success() {
        assert!(IndexOutcome::Indexed { attempts: 1 }.succeeded());
        assert!(!IndexOutcome::Ineligible.succeeded());
        assert!(!IndexOutcome::Failed {
            attempts: 1,
            reason: String::new()
        }
        .succeeded());
    }
}
