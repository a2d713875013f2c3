//! Update session: search, download and install over the bridge.
//!
//! Every job goes through an `OperationBridge`, so all three share one
//! completion policy: only `Succeeded` and `SucceededWithErrors` count as done.

use std::sync::Arc;

use tracing::info;

use crate::agent::model::{Update, UpdateCollection};
use crate::agent::progress::{DownloadProgress, InstallationProgress};
use crate::agent::service::{BatchRequest, BatchResult, SearchRequest, UpdateService};
use crate::bridge::OperationBridge;
use crate::config::SessionConfig;
use crate::dispatch::{ProgressDispatcher, ProgressEvent, ProgressSnapshot};
use crate::error::{CallbackError, SessionError};
use crate::messages::{MessageTable, UpdateAgentMessages};
use crate::signal::Timeout;

pub struct Session<S: UpdateService> {
    service: S,
    config: SessionConfig,
    reboot_required: bool,
    messages: Arc<dyn MessageTable>,
}

impl<S: UpdateService> Session<S> {
    /// Register with the service and read the current restart state.
    pub fn open(mut service: S, config: SessionConfig) -> Result<Self, SessionError<S::Error>> {
        service
            .set_client_application_id(&config.client_application_id)
            .map_err(SessionError::Service)?;
        let reboot_required = service.reboot_required().map_err(SessionError::Service)?;

        Ok(Session {
            service,
            config,
            reboot_required,
            messages: Arc::new(UpdateAgentMessages),
        })
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageTable>) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True once anything seen by this session needs a restart.
    pub fn reboot_required(&self) -> bool {
        self.reboot_required
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Search with the configured timeout.
    pub fn search(&mut self, criteria: &str) -> Result<UpdateCollection, SessionError<S::Error>> {
        let timeout = self.config.search_timeout;
        self.search_with_timeout(criteria, timeout)
    }

    /// Search for applicable updates.
    ///
    /// Updates that already wait for a restart are left out of the result and
    /// mark the session as needing one.
    pub fn search_with_timeout(
        &mut self,
        criteria: &str,
        timeout: Timeout,
    ) -> Result<UpdateCollection, SessionError<S::Error>> {
        let searcher = self.service.searcher().map_err(SessionError::Service)?;
        let completed = OperationBridge::new(searcher)
            .with_messages(Arc::clone(&self.messages))
            .wait(
                timeout,
                SearchRequest {
                    criteria: criteria.to_string(),
                },
            )?;

        let mut updates = UpdateCollection::new();
        for update in completed.output.updates.iter() {
            if update.reboot_required {
                info!(title = %update.title, "update already pending restart; skipped");
                self.reboot_required = true;
                continue;
            }
            updates.add(update.clone());
        }

        info!(count = updates.len(), outcome = %completed.outcome, "search finished");
        Ok(updates)
    }

    /// Download `updates`, reporting each progress tick to `callback`.
    pub fn download<F>(
        &mut self,
        updates: &UpdateCollection,
        callback: F,
    ) -> Result<BatchResult, SessionError<S::Error>>
    where
        F: Fn(ProgressEvent<'_, Update, DownloadProgress>) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        let downloader = self.service.downloader().map_err(SessionError::Service)?;
        let request = batch_request(updates, callback);
        let completed = OperationBridge::new(downloader)
            .with_messages(Arc::clone(&self.messages))
            .wait(self.config.download_timeout, request)?;

        info!(count = updates.len(), outcome = %completed.outcome, "download finished");
        Ok(completed.output)
    }

    /// Install `updates`, reporting each progress tick to `callback`.
    pub fn install<F>(
        &mut self,
        updates: &UpdateCollection,
        callback: F,
    ) -> Result<BatchResult, SessionError<S::Error>>
    where
        F: Fn(ProgressEvent<'_, Update, InstallationProgress>) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        let installer = self.service.installer().map_err(SessionError::Service)?;
        let request = batch_request(updates, callback);
        let completed = OperationBridge::new(installer)
            .with_messages(Arc::clone(&self.messages))
            .wait(self.config.install_timeout, request)?;

        self.reboot_required |= completed.output.reboot_required;
        info!(
            count = updates.len(),
            outcome = %completed.outcome,
            reboot_required = completed.output.reboot_required,
            "install finished"
        );
        Ok(completed.output)
    }
}

fn batch_request<P, F>(updates: &UpdateCollection, callback: F) -> BatchRequest<P>
where
    P: ProgressSnapshot + 'static,
    F: Fn(ProgressEvent<'_, Update, P>) -> Result<(), CallbackError> + Send + Sync + 'static,
{
    let shared = updates.to_shared();
    BatchRequest {
        updates: Arc::clone(&shared),
        progress: ProgressDispatcher::new(shared, callback),
    }
}
