//! Progress snapshots delivered by download and installation jobs.

use std::fmt;

use crate::dispatch::{PartialResult, ProgressSnapshot};
use crate::error::SnapshotError;
use crate::outcome::{classify, Outcome};
use crate::size::{format_percent, format_transfer};

/// Per-update result while a batch job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemResult {
    pub result_code: i32,
    pub error_code: i32,
}

impl ItemResult {
    pub fn new(result_code: i32) -> Self {
        ItemResult {
            result_code,
            error_code: 0,
        }
    }

    pub fn outcome(&self) -> Outcome {
        classify(self.result_code)
    }
}

impl PartialResult for ItemResult {
    fn result_code(&self) -> i32 {
        self.result_code
    }

    fn error_code(&self) -> i32 {
        self.error_code
    }
}

fn item_at(
    results: &[Option<ItemResult>],
    index: usize,
) -> Result<Option<ItemResult>, SnapshotError> {
    match results.get(index) {
        Some(result) => Ok(*result),
        None => Err(SnapshotError::new(format!("no result slot for update {}", index))),
    }
}

/// Snapshot of a running download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    pub current_index: i64,
    pub current_bytes_downloaded: u64,
    pub current_bytes_to_download: u64,
    pub total_bytes_downloaded: u64,
    pub total_bytes_to_download: u64,
    pub percent_complete: i32,
    /// One slot per update; `None` until the update has produced a result.
    pub item_results: Vec<Option<ItemResult>>,
}

impl ProgressSnapshot for DownloadProgress {
    type Partial = ItemResult;

    fn current_index(&self) -> Result<i64, SnapshotError> {
        Ok(self.current_index)
    }

    fn item_result(&self, index: usize) -> Result<Option<ItemResult>, SnapshotError> {
        item_at(&self.item_results, index)
    }
}

impl fmt::Display for DownloadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            format_percent(self.percent_complete),
            format_transfer(self.total_bytes_downloaded, self.total_bytes_to_download)
        )
    }
}

/// Snapshot of a running installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationProgress {
    pub current_index: i64,
    pub current_percent_complete: i32,
    pub percent_complete: i32,
    pub item_results: Vec<Option<ItemResult>>,
}

impl ProgressSnapshot for InstallationProgress {
    type Partial = ItemResult;

    fn current_index(&self) -> Result<i64, SnapshotError> {
        Ok(self.current_index)
    }

    fn item_result(&self, index: usize) -> Result<Option<ItemResult>, SnapshotError> {
        item_at(&self.item_results, index)
    }
}

impl fmt::Display for InstallationProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (current {})",
            format_percent(self.percent_complete),
            format_percent(self.current_percent_complete).trim_start()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::code;

    #[test]
    fn test_download_progress_display() {
        let progress = DownloadProgress {
            current_index: 0,
            current_bytes_downloaded: 0,
            current_bytes_to_download: 0,
            total_bytes_downloaded: 50 * 1024 * 1024,
            total_bytes_to_download: 80 * 1024 * 1024,
            percent_complete: 62,
            item_results: vec![None],
        };
        assert_eq!(progress.to_string(), " 62% 50/80MB");
    }

    #[test]
    fn test_installation_progress_display() {
        let progress = InstallationProgress {
            current_index: 1,
            current_percent_complete: 40,
            percent_complete: 70,
            item_results: vec![None, None],
        };
        assert_eq!(progress.to_string(), " 70% (current 40%)");
    }

    #[test]
    fn test_item_result_lookup() {
        let progress = InstallationProgress {
            current_index: 0,
            current_percent_complete: 100,
            percent_complete: 50,
            item_results: vec![Some(ItemResult::new(code::SUCCEEDED)), None],
        };

        let first = progress.item_result(0).expect("slot 0 exists");
        assert_eq!(first.map(|r| r.outcome()), Some(Outcome::Succeeded));
        assert_eq!(progress.item_result(1).expect("slot 1 exists"), None);
        assert!(progress.item_result(2).is_err());
    }
}
