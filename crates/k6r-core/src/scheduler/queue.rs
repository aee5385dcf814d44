use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{OverflowPolicy, QueueConfig},
    error::CoreError,
    scheduler::Job,
};

/// Sending half of the submission queue.
#[derive(Debug)]
pub(crate) enum JobSender {
    Unbounded(mpsc::UnboundedSender<Job>),
    Bounded {
        tx: mpsc::Sender<Job>,
        capacity: usize,
        overflow: OverflowPolicy,
    },
}

/// Receiving half of the submission queue, shared by all workers.
#[derive(Debug)]
pub(crate) enum JobReceiver {
    Unbounded(mpsc::UnboundedReceiver<Job>),
    Bounded(mpsc::Receiver<Job>),
}

impl JobReceiver {
    pub(crate) async fn recv(&mut self) -> Option<Job> {
        match self {
            JobReceiver::Unbounded(rx) => rx.recv().await,
            JobReceiver::Bounded(rx) => rx.recv().await,
        }
    }
}

pub(crate) fn channel(cfg: QueueConfig) -> (JobSender, JobReceiver) {
    match cfg.capacity {
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (JobSender::Unbounded(tx), JobReceiver::Unbounded(rx))
        }
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (
                JobSender::Bounded {
                    tx,
                    capacity,
                    overflow: cfg.overflow,
                },
                JobReceiver::Bounded(rx),
            )
        }
    }
}

/// A reserved place in the queue.
///
/// Taken before the run is registered, so a rejected submission never leaves a record behind.
/// Dropping an unused slot gives the place back.
#[derive(Debug)]
pub struct Slot<'a>(SlotInner<'a>);

#[derive(Debug)]
enum SlotInner<'a> {
    Unbounded(&'a mpsc::UnboundedSender<Job>),
    Bounded(mpsc::Permit<'a, Job>),
}

impl JobSender {
    pub(crate) async fn reserve(&self, cancel: &CancellationToken) -> Result<Slot<'_>, CoreError> {
        match self {
            JobSender::Unbounded(tx) => Ok(Slot(SlotInner::Unbounded(tx))),
            JobSender::Bounded {
                tx,
                capacity,
                overflow: OverflowPolicy::Reject,
            } => match tx.try_reserve() {
                Ok(permit) => Ok(Slot(SlotInner::Bounded(permit))),
                Err(mpsc::error::TrySendError::Full(())) => Err(CoreError::QueueFull {
                    capacity: *capacity,
                }),
                Err(mpsc::error::TrySendError::Closed(())) => Err(CoreError::ShuttingDown),
            },
            JobSender::Bounded {
                tx,
                overflow: OverflowPolicy::Block,
                ..
            } => tokio::select! {
                permit = tx.reserve() => permit
                    .map(|p| Slot(SlotInner::Bounded(p)))
                    .map_err(|_| CoreError::ShuttingDown),
                _ = cancel.cancelled() => Err(CoreError::ShuttingDown),
            },
        }
    }
}

impl Slot<'_> {
    pub(crate) fn send(self, job: Job) -> Result<(), CoreError> {
        match self.0 {
            SlotInner::Unbounded(tx) => tx.send(job).map_err(|_| CoreError::ShuttingDown),
            SlotInner::Bounded(permit) => {
                permit.send(job);
                Ok(())
            }
        }
    }
}
