//! In-process update agent used by the `waffle` binary.
//!
//! Each job runs on its own worker thread, reports progress through the
//! dispatcher it was started with and stops early when an abort arrives on
//! its channel. `cleanup` joins the worker, so no progress notification can
//! arrive after a job has been released.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::ValueEnum;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use engine::agent::{
    BatchResult, DownloadProgress, DownloadRequest, InstallRequest, InstallationProgress,
    ItemResult, SearchRequest, SearchResult, Update, UpdateService,
};
use engine::messages::WU_E_NO_CONNECTION;
use engine::outcome::code;
use engine::{AsyncOperation, CompletionNotifier, JobHandle};
use thiserror::Error;
use tracing::{debug, warn};

/// Progress ticks reported per update.
const STEPS: u64 = 4;

const MB: u64 = 1024 * 1024;

/// How the simulated agent behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Every job succeeds.
    Normal,
    /// The search never completes.
    Hang,
    /// The second download loses its connection.
    FailDownload,
    /// One update already waits for a restart and installation asks for another.
    Reboot,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to spawn {kind} worker")]
    Spawn {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} worker produced no result")]
    NoResult { kind: &'static str },

    #[error("{kind} result slot poisoned")]
    Poisoned { kind: &'static str },
}

/// Paces a worker and tells it when to stop.
struct Pacer {
    tick: Duration,
    abort: Receiver<()>,
}

impl Pacer {
    /// Sleep one tick; false once an abort was requested or the job released.
    fn pause(&self) -> bool {
        match self.abort.recv_timeout(self.tick) {
            Err(RecvTimeoutError::Timeout) => true,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Block until the job is aborted or released.
    fn hold(&self) {
        let _ = self.abort.recv();
    }
}

/// A running simulated job.
pub struct SimJob<T> {
    kind: &'static str,
    abort_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    result: Arc<Mutex<Option<T>>>,
}

impl<T> SimJob<T> {
    fn take_result(&mut self) -> Result<T, SimError> {
        let kind = self.kind;
        self.result
            .lock()
            .map_err(|_| SimError::Poisoned { kind })?
            .take()
            .ok_or(SimError::NoResult { kind })
    }
}

impl<T> JobHandle for SimJob<T> {
    type Error = SimError;

    fn request_abort(&mut self) -> Result<(), SimError> {
        debug!(kind = self.kind, "abort requested");
        if let Some(tx) = &self.abort_tx {
            // a full channel already carries an abort
            let _ = tx.try_send(());
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.abort_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(kind = self.kind, "worker thread panicked");
            }
        }
    }
}

fn spawn_job<T, F>(
    kind: &'static str,
    tick: Duration,
    completion: CompletionNotifier,
    work: F,
) -> Result<SimJob<T>, SimError>
where
    T: Send + 'static,
    F: FnOnce(&Pacer) -> Option<T> + Send + 'static,
{
    let (abort_tx, abort_rx) = bounded(1);
    let result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&result);

    let worker = thread::Builder::new()
        .name(format!("sim-{}", kind))
        .spawn(move || {
            let pacer = Pacer {
                tick,
                abort: abort_rx,
            };
            // None means the job was stopped and never completes
            let Some(output) = work(&pacer) else {
                debug!(kind, "worker stopped before completion");
                return;
            };
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(output);
            }
            let status = completion.complete();
            if !status.is_ok() {
                warn!(kind, %status, "completion notification failed");
            }
        })
        .map_err(|source| SimError::Spawn { kind, source })?;

    Ok(SimJob {
        kind,
        abort_tx: Some(abort_tx),
        worker: Some(worker),
        result,
    })
}

/// Result slots for a batch: finished items, the current one, then untouched.
fn item_slots(count: usize, current: usize, current_result: ItemResult) -> Vec<Option<ItemResult>> {
    (0..count)
        .map(|i| match i.cmp(&current) {
            std::cmp::Ordering::Less => Some(ItemResult::new(code::SUCCEEDED)),
            std::cmp::Ordering::Equal => Some(current_result),
            std::cmp::Ordering::Greater => None,
        })
        .collect()
}

fn percent(done: u64, total: u64) -> i32 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total) as i32
}

pub struct SimSearcher {
    scenario: Scenario,
    tick: Duration,
    catalog: Vec<Update>,
}

impl AsyncOperation for SimSearcher {
    const KIND: &'static str = "search";

    type Request = SearchRequest;
    type Job = SimJob<SearchResult>;
    type Output = SearchResult;
    type Error = SimError;

    fn begin(
        &mut self,
        request: SearchRequest,
        completion: CompletionNotifier,
    ) -> Result<Self::Job, SimError> {
        debug!(criteria = %request.criteria, "simulated search");
        let scenario = self.scenario;
        let catalog = self.catalog.clone();

        spawn_job(Self::KIND, self.tick, completion, move |pacer| {
            if scenario == Scenario::Hang {
                pacer.hold();
                return None;
            }
            if !pacer.pause() {
                return None;
            }
            Some(SearchResult {
                result_code: code::SUCCEEDED,
                error_code: 0,
                updates: catalog.into_iter().collect(),
            })
        })
    }

    fn end(&mut self, job: &mut Self::Job) -> Result<SearchResult, SimError> {
        job.take_result()
    }
}

pub struct SimDownloader {
    scenario: Scenario,
    tick: Duration,
}

impl AsyncOperation for SimDownloader {
    const KIND: &'static str = "download";

    type Request = DownloadRequest;
    type Job = SimJob<BatchResult>;
    type Output = BatchResult;
    type Error = SimError;

    fn begin(
        &mut self,
        request: DownloadRequest,
        completion: CompletionNotifier,
    ) -> Result<Self::Job, SimError> {
        let fail_at = match self.scenario {
            Scenario::FailDownload => Some(request.updates.len().min(2).saturating_sub(1)),
            _ => None,
        };

        spawn_job(Self::KIND, self.tick, completion, move |pacer| {
            let count = request.updates.len();
            let sizes: Vec<u64> = (0..count as u64).map(|i| (i + 1) * 40 * MB).collect();
            let total: u64 = sizes.iter().sum();
            let mut finished = 0u64;

            for (index, size) in sizes.iter().copied().enumerate() {
                for step in 1..=STEPS {
                    if !pacer.pause() {
                        return None;
                    }
                    let current = size * step / STEPS;
                    let failed = fail_at == Some(index) && step == 2;
                    let item = if failed {
                        ItemResult {
                            result_code: code::FAILED,
                            error_code: WU_E_NO_CONNECTION,
                        }
                    } else {
                        ItemResult::new(code::IN_PROGRESS)
                    };

                    let status = request.progress.dispatch(&DownloadProgress {
                        current_index: index as i64,
                        current_bytes_downloaded: current,
                        current_bytes_to_download: size,
                        total_bytes_downloaded: finished + current,
                        total_bytes_to_download: total,
                        percent_complete: percent(finished + current, total),
                        item_results: item_slots(count, index, item),
                    });
                    if !status.is_ok() {
                        debug!(index, %status, "progress callback reported a failure");
                    }

                    if failed {
                        let mut item_results = vec![code::SUCCEEDED; index];
                        item_results.push(code::FAILED);
                        item_results.resize(count, code::NOT_STARTED);
                        return Some(BatchResult {
                            result_code: code::FAILED,
                            error_code: WU_E_NO_CONNECTION,
                            reboot_required: false,
                            item_results,
                        });
                    }
                }
                finished += size;
            }

            Some(BatchResult {
                result_code: code::SUCCEEDED,
                error_code: 0,
                reboot_required: false,
                item_results: vec![code::SUCCEEDED; count],
            })
        })
    }

    fn end(&mut self, job: &mut Self::Job) -> Result<BatchResult, SimError> {
        job.take_result()
    }
}

pub struct SimInstaller {
    scenario: Scenario,
    tick: Duration,
}

impl AsyncOperation for SimInstaller {
    const KIND: &'static str = "install";

    type Request = InstallRequest;
    type Job = SimJob<BatchResult>;
    type Output = BatchResult;
    type Error = SimError;

    fn begin(
        &mut self,
        request: InstallRequest,
        completion: CompletionNotifier,
    ) -> Result<Self::Job, SimError> {
        let reboot_required = self.scenario == Scenario::Reboot;

        spawn_job(Self::KIND, self.tick, completion, move |pacer| {
            let count = request.updates.len();
            for index in 0..count {
                for step in 1..=STEPS {
                    if !pacer.pause() {
                        return None;
                    }
                    let current = percent(step, STEPS);
                    let overall = (index as i32 * 100 + current) / count as i32;
                    request.progress.dispatch(&InstallationProgress {
                        current_index: index as i64,
                        current_percent_complete: current,
                        percent_complete: overall,
                        item_results: item_slots(count, index, ItemResult::new(code::IN_PROGRESS)),
                    });
                }
            }

            Some(BatchResult {
                result_code: code::SUCCEEDED,
                error_code: 0,
                reboot_required,
                item_results: vec![code::SUCCEEDED; count],
            })
        })
    }

    fn end(&mut self, job: &mut Self::Job) -> Result<BatchResult, SimError> {
        job.take_result()
    }
}

/// An update service backed by worker threads instead of a real agent.
pub struct SimulatedAgent {
    scenario: Scenario,
    tick: Duration,
    catalog: Vec<Update>,
    client_id: Option<String>,
}

impl SimulatedAgent {
    pub fn new(scenario: Scenario) -> Self {
        let mut catalog = vec![
            Update::new("Security Intelligence Update for Microsoft Defender Antivirus")
                .with_kb("2267602"),
            Update::new("Cumulative Update for Windows").with_kb("5034441"),
            Update::new("Windows Malicious Software Removal Tool").with_kb("890830"),
        ];
        if scenario == Scenario::Reboot {
            let mut pending = Update::new("Servicing Stack Update for Windows").with_kb("5031000");
            pending.reboot_required = true;
            catalog.insert(2, pending);
        }

        SimulatedAgent {
            scenario,
            tick: Duration::from_millis(50),
            catalog,
            client_id: None,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }
}

impl UpdateService for SimulatedAgent {
    type Error = SimError;
    type Searcher = SimSearcher;
    type Downloader = SimDownloader;
    type Installer = SimInstaller;

    fn set_client_application_id(&mut self, id: &str) -> Result<(), SimError> {
        self.client_id = Some(id.to_string());
        Ok(())
    }

    fn reboot_required(&self) -> Result<bool, SimError> {
        Ok(false)
    }

    fn searcher(&mut self) -> Result<SimSearcher, SimError> {
        Ok(SimSearcher {
            scenario: self.scenario,
            tick: self.tick,
            catalog: self.catalog.clone(),
        })
    }

    fn downloader(&mut self) -> Result<SimDownloader, SimError> {
        Ok(SimDownloader {
            scenario: self.scenario,
            tick: self.tick,
        })
    }

    fn installer(&mut self) -> Result<SimInstaller, SimError> {
        Ok(SimInstaller {
            scenario: self.scenario,
            tick: self.tick,
        })
    }
}
