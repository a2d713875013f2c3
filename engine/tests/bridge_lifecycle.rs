//! End-to-end bridge runs against stub jobs that notify from their own thread.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use engine::outcome::code;
use engine::{
    AsyncOperation, BridgeError, BridgeState, CallbackError, CallbackStatus, CompletionNotifier,
    JobHandle, OperationBridge, OperationReport, Outcome, PartialResult, ProgressDispatcher,
    ProgressEvent, ProgressSnapshot, SnapshotError, Timeout,
};
use tracing_test::traced_test;

#[derive(Debug, Clone, Copy)]
struct Tick {
    index: i64,
    code: i32,
}

#[derive(Debug, Clone, Copy)]
struct ItemCode(i32);

impl PartialResult for ItemCode {
    fn result_code(&self) -> i32 {
        self.0
    }
}

impl ProgressSnapshot for Tick {
    type Partial = ItemCode;

    fn current_index(&self) -> Result<i64, SnapshotError> {
        Ok(self.index)
    }

    fn item_result(&self, _index: usize) -> Result<Option<ItemCode>, SnapshotError> {
        Ok(Some(ItemCode(self.code)))
    }
}

#[derive(Debug)]
struct Final(i32);

impl OperationReport for Final {
    fn result_code(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Calls {
    aborts: AtomicU32,
    cleanups: AtomicU32,
    statuses: Mutex<Vec<CallbackStatus>>,
}

/// What the stub job's worker thread does.
#[derive(Clone)]
struct Script {
    ticks: Vec<Tick>,
    complete: bool,
    final_code: i32,
    abort_fails: bool,
}

impl Script {
    fn completing(ticks: Vec<Tick>, final_code: i32) -> Self {
        Script {
            ticks,
            complete: true,
            final_code,
            abort_fails: false,
        }
    }

    fn hanging() -> Self {
        Script {
            ticks: Vec::new(),
            complete: false,
            final_code: code::SUCCEEDED,
            abort_fails: false,
        }
    }
}

struct ThreadJob {
    calls: Arc<Calls>,
    abort_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    abort_fails: bool,
}

impl JobHandle for ThreadJob {
    type Error = io::Error;

    fn request_abort(&mut self) -> Result<(), io::Error> {
        self.calls.aborts.fetch_add(1, Ordering::SeqCst);
        if self.abort_fails {
            return Err(io::Error::new(io::ErrorKind::Other, "cancellation not allowed"));
        }
        if let Some(tx) = &self.abort_tx {
            let _ = tx.try_send(());
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        self.calls.cleanups.fetch_add(1, Ordering::SeqCst);
        // disconnecting the channel releases a worker that is still waiting
        self.abort_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct ThreadOp {
    script: Script,
    calls: Arc<Calls>,
}

impl AsyncOperation for ThreadOp {
    const KIND: &'static str = "stub";

    type Request = ProgressDispatcher<String, Tick>;
    type Job = ThreadJob;
    type Output = Final;
    type Error = io::Error;

    fn begin(
        &mut self,
        dispatcher: ProgressDispatcher<String, Tick>,
        completion: CompletionNotifier,
    ) -> Result<ThreadJob, io::Error> {
        let (abort_tx, abort_rx): (Sender<()>, Receiver<()>) = bounded(1);
        let script = self.script.clone();
        let calls = Arc::clone(&self.calls);

        let worker = thread::spawn(move || {
            for tick in &script.ticks {
                let status = dispatcher.dispatch(tick);
                if let Ok(mut statuses) = calls.statuses.lock() {
                    statuses.push(status);
                }
            }
            if script.complete {
                completion.complete();
            } else {
                // hang until aborted or released
                let _ = abort_rx.recv();
            }
        });

        Ok(ThreadJob {
            calls: Arc::clone(&self.calls),
            abort_tx: Some(abort_tx),
            worker: Some(worker),
            abort_fails: self.script.abort_fails,
        })
    }

    fn end(&mut self, _job: &mut ThreadJob) -> Result<Final, io::Error> {
        assert_eq!(self.calls.cleanups.load(Ordering::SeqCst), 0);
        Ok(Final(self.script.final_code))
    }
}

fn items() -> Arc<[String]> {
    Arc::from(vec!["KB5034441".to_string(), "KB2267602".to_string()])
}

type TickEvent<'a> = ProgressEvent<'a, String, Tick>;

type Seen = Arc<Mutex<Vec<(usize, String, Outcome)>>>;

fn recording_dispatcher() -> (ProgressDispatcher<String, Tick>, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let dispatcher = ProgressDispatcher::new(items(), move |event: TickEvent<'_>| {
        sink.lock()
            .map_err(|_| CallbackError::new("recorder poisoned"))?
            .push((event.index, event.item.clone(), event.outcome));
        Ok(())
    });
    (dispatcher, seen)
}

fn in_progress(index: i64) -> Tick {
    Tick {
        index,
        code: code::IN_PROGRESS,
    }
}

#[test]
fn test_three_ticks_then_succeeded() {
    let calls = Arc::new(Calls::default());
    let script = Script::completing(vec![in_progress(0); 3], code::SUCCEEDED);
    let (dispatcher, seen) = recording_dispatcher();
    let mut bridge = OperationBridge::new(ThreadOp {
        script,
        calls: Arc::clone(&calls),
    });

    let completed = bridge
        .wait(Timeout::from_millis(5000), dispatcher)
        .expect("stub job should succeed");

    assert_eq!(completed.outcome, Outcome::Succeeded);
    assert_eq!(bridge.state(), BridgeState::Completed);

    let seen = seen.lock().expect("lock poisoned");
    assert_eq!(seen.len(), 3);
    for (index, item, outcome) in seen.iter() {
        assert_eq!(*index, 0);
        assert_eq!(item, "KB5034441");
        assert_eq!(*outcome, Outcome::InProgress);
    }
    assert_eq!(calls.cleanups.load(Ordering::SeqCst), 1);
    assert_eq!(calls.aborts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_job_that_never_completes_times_out() {
    let calls = Arc::new(Calls::default());
    let (dispatcher, _) = recording_dispatcher();
    let mut bridge = OperationBridge::new(ThreadOp {
        script: Script::hanging(),
        calls: Arc::clone(&calls),
    });

    let started = Instant::now();
    let err = bridge
        .wait(Timeout::from_millis(100), dispatcher)
        .expect_err("job never signals");
    let elapsed = started.elapsed();

    assert!(matches!(err, BridgeError::TimedOut { .. }));
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "wait overran: {:?}", elapsed);
    assert_eq!(bridge.state(), BridgeState::Aborted);
    assert_eq!(calls.aborts.load(Ordering::SeqCst), 1);
    assert_eq!(calls.cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_zero_timeout_still_cleans_up() {
    let calls = Arc::new(Calls::default());
    let (dispatcher, _) = recording_dispatcher();

    let err = OperationBridge::new(ThreadOp {
        script: Script::hanging(),
        calls: Arc::clone(&calls),
    })
    .wait(Timeout::from_millis(0), dispatcher)
    .expect_err("zero timeout on a hanging job");

    assert!(err.is_timeout());
    assert_eq!(calls.aborts.load(Ordering::SeqCst), 1);
    assert_eq!(calls.cleanups.load(Ordering::SeqCst), 1);
}

#[test]
#[traced_test]
fn test_failed_abort_is_logged_not_returned() {
    let calls = Arc::new(Calls::default());
    let mut script = Script::hanging();
    script.abort_fails = true;
    let (dispatcher, _) = recording_dispatcher();

    let err = OperationBridge::new(ThreadOp {
        script,
        calls: Arc::clone(&calls),
    })
    .wait(Timeout::from_millis(50), dispatcher)
    .expect_err("job never signals");

    assert!(err.is_timeout());
    assert_eq!(calls.cleanups.load(Ordering::SeqCst), 1);
    assert!(logs_contain("abort request failed"));
}

#[test]
fn test_out_of_range_ticks_are_rejected_on_job_thread() {
    let calls = Arc::new(Calls::default());
    let ticks = vec![in_progress(0), in_progress(2), in_progress(-1)];
    let script = Script::completing(ticks, code::SUCCEEDED);
    let (dispatcher, seen) = recording_dispatcher();

    OperationBridge::new(ThreadOp {
        script,
        calls: Arc::clone(&calls),
    })
    .wait(Timeout::from_millis(5000), dispatcher)
    .expect("stub job should succeed");

    assert_eq!(seen.lock().expect("lock poisoned").len(), 1);
    assert_eq!(
        *calls.statuses.lock().expect("lock poisoned"),
        vec![
            CallbackStatus::Ok,
            CallbackStatus::IndexOutOfRange,
            CallbackStatus::IndexOutOfRange,
        ]
    );
}

#[test]
fn test_panicking_callback_does_not_reach_job_thread() {
    let calls = Arc::new(Calls::default());
    let script = Script::completing(vec![in_progress(0), in_progress(1)], code::SUCCEEDED);
    let dispatcher = ProgressDispatcher::new(
        items(),
        |event: TickEvent<'_>| -> Result<(), CallbackError> {
            if event.index == 1 {
                panic!("progress renderer bug");
            }
            Ok(())
        },
    );

    let completed = OperationBridge::new(ThreadOp {
        script,
        calls: Arc::clone(&calls),
    })
    .wait(Timeout::from_millis(5000), dispatcher)
    .expect("job completes despite the callback panic");

    assert_eq!(completed.outcome, Outcome::Succeeded);
    assert_eq!(
        *calls.statuses.lock().expect("lock poisoned"),
        vec![CallbackStatus::Ok, CallbackStatus::UserCallbackFailed]
    );
}

#[test]
fn test_aborted_job_outcome_is_an_error() {
    let calls = Arc::new(Calls::default());
    let script = Script::completing(Vec::new(), code::ABORTED);
    let (dispatcher, _) = recording_dispatcher();

    let err = OperationBridge::new(ThreadOp {
        script,
        calls: Arc::clone(&calls),
    })
    .wait(Timeout::Infinite, dispatcher)
    .expect_err("aborted outcome is not success");

    assert_eq!(err.outcome(), Some(Outcome::Aborted));
    assert_eq!(calls.cleanups.load(Ordering::SeqCst), 1);
}
