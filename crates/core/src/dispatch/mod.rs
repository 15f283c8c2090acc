//! Marshals work from other threads onto the thread that owns native state.
//!
//! SDL's video and rendering calls must all come from one thread. Worker
//! threads hold a [`Dispatcher`] and submit closures; the owning thread
//! drains its [`JobQueue`] once per frame and runs them, in submission
//! order, against its `!Send` state (usually a [`crate::Context`]).

use std::{
    fmt,
    marker::PhantomData,
    thread::{self, ThreadId},
    time::Duration,
};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{Result, SdlError};

type Job<S> = Box<dyn FnOnce(&S) + Send>;

/// Creates a dispatcher/queue pair. The queue belongs to the calling thread.
pub fn channel<S>() -> (Dispatcher<S>, JobQueue<S>) {
    let (sender, receiver) = unbounded();
    let owner = thread::current().id();
    (
        Dispatcher { sender, owner },
        JobQueue {
            receiver,
            owner,
            _pinned: PhantomData,
        },
    )
}

/// Cloneable, `Send` submission side.
pub struct Dispatcher<S> {
    sender: Sender<Job<S>>,
    owner: ThreadId,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Queues `job` and returns a handle to its eventual result.
    pub fn submit<R, F>(&self, job: F) -> Result<Pending<R>>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> R + Send + 'static,
    {
        let (reply, receiver) = bounded(1);
        let boxed: Job<S> = Box::new(move |state: &S| {
            // The submitter may have stopped waiting.
            let _ = reply.send(job(state));
        });
        self.sender.send(boxed).map_err(|_| SdlError::Dispatch {
            reason: "the owning thread has stopped accepting jobs",
        })?;
        Ok(Pending { receiver })
    }

    /// Runs `job` on the owning thread and waits for its result.
    ///
    /// Calling this from the owning thread would wait on itself forever, so
    /// it is rejected.
    pub fn call<R, F>(&self, job: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&S) -> R + Send + 'static,
    {
        if thread::current().id() == self.owner {
            return Err(SdlError::Dispatch {
                reason: "blocking call issued from the owning thread",
            });
        }
        self.submit(job)?.wait()
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("owner", &self.owner)
            .field("queued", &self.sender.len())
            .finish()
    }
}

/// Result of a submitted job.
#[derive(Debug)]
pub struct Pending<R> {
    receiver: Receiver<R>,
}

impl<R> Pending<R> {
    pub fn wait(self) -> Result<R> {
        self.receiver.recv().map_err(|_| SdlError::Dispatch {
            reason: "the job was dropped before it ran",
        })
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<R> {
        self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => SdlError::Dispatch {
                reason: "timed out waiting for the owning thread",
            },
            RecvTimeoutError::Disconnected => SdlError::Dispatch {
                reason: "the job was dropped before it ran",
            },
        })
    }
}

/// Receiving side, pinned to the thread that created it.
pub struct JobQueue<S> {
    receiver: Receiver<Job<S>>,
    owner: ThreadId,
    _pinned: PhantomData<*const ()>,
}

impl<S> JobQueue<S> {
    /// Runs every job queued so far. Returns how many ran.
    pub fn run_pending(&self, state: &S) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(job) => {
                    job(state);
                    ran += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if ran > 0 {
            tracing::trace!(ran, "ran dispatched jobs");
        }
        ran
    }

    /// Waits up to `timeout` for at least one job, then drains the queue.
    pub fn run_for(&self, state: &S, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job(state);
                1 + self.run_pending(state)
            }
            Err(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<S> fmt::Debug for JobQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue")
            .field("owner", &self.owner)
            .field("queued", &self.receiver.len())
            .finish()
    }
}
