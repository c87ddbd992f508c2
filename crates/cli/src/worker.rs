//! Single-worker executor for audits started from the terminal UI.
//!
//! Jobs run one at a time, in submission order, on a dedicated thread. Each
//! job carries a completion callback that runs on the worker thread after the
//! job, whether it returned or panicked.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// How a submitted job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome<T> {
    Finished(T),
    /// The job panicked; carries the panic message.
    Panicked(String),
}

/// The worker thread is gone; no more jobs can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerClosed;

impl fmt::Display for WorkerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audit worker has stopped")
    }
}

impl std::error::Error for WorkerClosed {}

pub struct AuditWorker {
    sender: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl AuditWorker {
    pub fn spawn() -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("audit-worker".into())
            .spawn(move || {
                for job in receiver {
                    job();
                }
                log::debug!("audit worker: channel closed, exiting");
            })?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `job`; `on_complete` receives its outcome once it has run.
    pub fn submit<T, F, C>(&self, job: F, on_complete: C) -> Result<(), WorkerClosed>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(JobOutcome<T>) + Send + 'static,
    {
        let wrapped: Job = Box::new(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(job)) {
                Ok(value) => JobOutcome::Finished(value),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!("audit job panicked: {message}");
                    JobOutcome::Panicked(message)
                }
            };
            // A panicking callback must not take the worker down with it.
            if panic::catch_unwind(AssertUnwindSafe(|| on_complete(outcome))).is_err() {
                log::error!("audit completion callback panicked");
            }
        });

        self.sender
            .as_ref()
            .ok_or(WorkerClosed)?
            .send(wrapped)
            .map_err(|_| WorkerClosed)
    }
}

impl Drop for AuditWorker {
    /// Drains queued jobs, then joins the thread.
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
