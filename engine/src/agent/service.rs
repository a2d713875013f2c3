//! The external update service boundary.
//!
//! An `UpdateService` hands out the three callback-driven job kinds the
//! session runs through the bridge. Platform initialisation (COM apartments
//! and the like) belongs to the implementation, not to this crate.

use std::sync::Arc;

use crate::agent::model::{Update, UpdateCollection};
use crate::agent::progress::{DownloadProgress, InstallationProgress};
use crate::dispatch::{ProgressDispatcher, ProgressSnapshot};
use crate::job::{AsyncOperation, OperationReport};

/// Start parameters for a search job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub criteria: String,
}

/// Final result of a search job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub result_code: i32,
    pub error_code: i32,
    pub updates: UpdateCollection,
}

impl OperationReport for SearchResult {
    fn result_code(&self) -> i32 {
        self.result_code
    }

    fn error_code(&self) -> i32 {
        self.error_code
    }
}

/// Start parameters for a download or installation job: the frozen update
/// list plus the dispatcher the job must call for every progress tick.
pub struct BatchRequest<P: ProgressSnapshot> {
    pub updates: Arc<[Update]>,
    pub progress: ProgressDispatcher<Update, P>,
}

pub type DownloadRequest = BatchRequest<DownloadProgress>;
pub type InstallRequest = BatchRequest<InstallationProgress>;

/// Final result of a download or installation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub result_code: i32,
    pub error_code: i32,
    pub reboot_required: bool,
    /// Per-update result codes, in collection order.
    pub item_results: Vec<i32>,
}

impl OperationReport for BatchResult {
    fn result_code(&self) -> i32 {
        self.result_code
    }

    fn error_code(&self) -> i32 {
        self.error_code
    }
}

/// A source of update jobs.
pub trait UpdateService {
    type Error: std::error::Error + Send + Sync + 'static;

    type Searcher: AsyncOperation<
        Request = SearchRequest,
        Output = SearchResult,
        Error = Self::Error,
    >;
    type Downloader: AsyncOperation<
        Request = DownloadRequest,
        Output = BatchResult,
        Error = Self::Error,
    >;
    type Installer: AsyncOperation<
        Request = InstallRequest,
        Output = BatchResult,
        Error = Self::Error,
    >;

    fn set_client_application_id(&mut self, id: &str) -> Result<(), Self::Error>;

    /// Whether the system already has a restart pending.
    fn reboot_required(&self) -> Result<bool, Self::Error>;

    fn searcher(&mut self) -> Result<Self::Searcher, Self::Error>;

    fn downloader(&mut self) -> Result<Self::Downloader, Self::Error>;

    fn installer(&mut self) -> Result<Self::Installer, Self::Error>;
}
