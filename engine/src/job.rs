//! External job abstraction.
//!
//! An `AsyncOperation` is one kind of callback-driven job offered by an
//! external subsystem (search, download, install, ...). `begin` starts it and
//! hands back a `JobHandle`; `end` collects the final result once the job has
//! fired its completion notifier.
//!
//! The bridge owns the handle exclusively and wraps it in a `JobGuard`, which
//! guarantees `cleanup` runs exactly once on every exit path, unwinding
//! included.

use crate::signal::CompletionNotifier;

/// Handle to one in-flight external job.
pub trait JobHandle {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Ask the job to stop. Best effort: a failure here is logged, not surfaced.
    fn request_abort(&mut self) -> Result<(), Self::Error>;

    /// Release the job. Must tolerate being called after `request_abort`.
    fn cleanup(&mut self);
}

/// Final result of a job, as far as the bridge needs to judge it.
pub trait OperationReport {
    /// Raw operation result code, classified with `outcome::classify`.
    fn result_code(&self) -> i32;

    /// HRESULT-style error code; negative values are failures.
    fn error_code(&self) -> i32 {
        0
    }
}

/// One kind of callback-driven external job.
pub trait AsyncOperation {
    /// Short name used in logs and errors.
    const KIND: &'static str;

    type Request;
    type Job: JobHandle;
    type Output: OperationReport;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start the job. `completion` must be fired exactly once when the job
    /// finishes, after its last progress notification.
    fn begin(
        &mut self,
        request: Self::Request,
        completion: CompletionNotifier,
    ) -> Result<Self::Job, Self::Error>;

    /// Retrieve the final result of a completed job.
    fn end(&mut self, job: &mut Self::Job) -> Result<Self::Output, Self::Error>;
}

/// Scoped owner of a `JobHandle`.
#[derive(Debug)]
pub struct JobGuard<J: JobHandle> {
    job: J,
    released: bool,
}

impl<J: JobHandle> JobGuard<J> {
    pub fn new(job: J) -> Self {
        JobGuard {
            job,
            released: false,
        }
    }

    pub fn job_mut(&mut self) -> &mut J {
        &mut self.job
    }

    /// Request an abort. Errors are logged and swallowed.
    pub fn abort(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.job.request_abort() {
            tracing::warn!(error = %err, "abort request failed; abandoning job");
        }
    }

    /// Clean up the job now. Later calls and the drop are no-ops.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.job.cleanup();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<J: JobHandle> Drop for JobGuard<J> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    struct CountingJob {
        aborts: Rc<Cell<u32>>,
        cleanups: Rc<Cell<u32>>,
        fail_abort: bool,
    }

    impl JobHandle for CountingJob {
        type Error = io::Error;

        fn request_abort(&mut self) -> Result<(), io::Error> {
            self.aborts.set(self.aborts.get() + 1);
            if self.fail_abort {
                return Err(io::Error::new(io::ErrorKind::Other, "cannot cancel"));
            }
            Ok(())
        }

        fn cleanup(&mut self) {
            self.cleanups.set(self.cleanups.get() + 1);
        }
    }

    fn counting_job(fail_abort: bool) -> (CountingJob, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let aborts = Rc::new(Cell::new(0));
        let cleanups = Rc::new(Cell::new(0));
        let job = CountingJob {
            aborts: Rc::clone(&aborts),
            cleanups: Rc::clone(&cleanups),
            fail_abort,
        };
        (job, aborts, cleanups)
    }

    #[test]
    fn test_release_cleans_up_once() {
        let (job, _, cleanups) = counting_job(false);
        let mut guard = JobGuard::new(job);
        guard.release();
        guard.release();
        drop(guard);
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn test_drop_cleans_up() {
        let (job, _, cleanups) = counting_job(false);
        {
            let _guard = JobGuard::new(job);
        }
        assert_eq!(cleanups.get(), 1);
    }

    #[test]
    fn test_failed_abort_still_cleans_up() {
        let (job, aborts, cleanups) = counting_job(true);
        let mut guard = JobGuard::new(job);
        guard.abort();
        guard.release();
        assert_eq!(aborts.get(), 1);
        assert_eq!(cleanups.get(), 1);
        assert!(guard.is_released());
    }

    #[test]
    fn test_cleanup_runs_during_unwind() {
        let (job, _, cleanups) = counting_job(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = JobGuard::new(job);
            panic!("retrieval blew up");
        }));
        assert!(result.is_err());
        assert_eq!(cleanups.get(), 1);
    }
}
