//! Update agent layer.
//!
//! Runs the three update job kinds (search, download, install) of an
//! `UpdateService` through the generic bridge and keeps track of whether the
//! system needs a restart afterwards.

pub mod model;
pub mod progress;
pub mod service;
pub mod session;

pub use model::{DeploymentAction, Update, UpdateCollection};
pub use progress::{DownloadProgress, InstallationProgress, ItemResult};
pub use service::{
    BatchRequest, BatchResult, DownloadRequest, InstallRequest, SearchRequest, SearchResult,
    UpdateService,
};
pub use session::Session;
