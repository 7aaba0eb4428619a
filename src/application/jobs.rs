//! Background jobs
//!
//! Side effects of message creation run on a bounded task channel consumed
//! by a single worker. Every submission hands back a [`JobTicket`] that
//! resolves once the job has run; request handlers are free to drop it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::application::services::{ModerationService, TypingService};
use crate::domain::ConversationTarget;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Work submitted after a message is created.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Remove the sender's typing indicator on the target.
    ClearTyping {
        user_id: i64,
        target: ConversationTarget,
    },
    /// Run the content classifier over a message.
    Moderate { message_id: i64 },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::ClearTyping { .. } => "clear_typing",
            Job::Moderate { .. } => "moderate",
        }
    }
}

/// Final state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    /// The queue was full or the worker is gone.
    Dropped,
}

/// Receiver for the outcome of one job.
pub struct JobTicket(oneshot::Receiver<JobOutcome>);

impl JobTicket {
    /// Wait for the job to finish.
    pub async fn outcome(self) -> JobOutcome {
        self.0.await.unwrap_or(JobOutcome::Dropped)
    }
}

/// Executes jobs on the worker task.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), AppError>;
}

/// Routes jobs to the typing and moderation services.
pub struct ServiceJobHandler {
    typing: Arc<dyn TypingService>,
    moderation: Arc<dyn ModerationService>,
}

impl ServiceJobHandler {
    pub fn new(typing: Arc<dyn TypingService>, moderation: Arc<dyn ModerationService>) -> Self {
        Self { typing, moderation }
    }
}

#[async_trait]
impl JobHandler for ServiceJobHandler {
    async fn handle(&self, job: &Job) -> Result<(), AppError> {
        match job {
            Job::ClearTyping { user_id, target } => self.typing.remove(*user_id, *target).await,
            Job::Moderate { message_id } => {
                let verdict = self.moderation.run(*message_id).await?;
                debug!(message_id, ?verdict, "Moderation finished");
                Ok(())
            }
        }
    }
}

struct Envelope {
    job: Job,
    reply: oneshot::Sender<JobOutcome>,
}

/// Handle for submitting jobs. Cloning is cheap.
#[derive(Clone)]
pub struct JobDispatcher {
    tx: mpsc::Sender<Envelope>,
}

impl JobDispatcher {
    /// Start the worker task and return a dispatcher feeding it.
    pub fn spawn(capacity: usize, handler: Arc<dyn JobHandler>) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(Self::worker_loop(rx, handler));
        Self { tx }
    }

    async fn worker_loop(mut rx: mpsc::Receiver<Envelope>, handler: Arc<dyn JobHandler>) {
        while let Some(Envelope { job, reply }) = rx.recv().await {
            let outcome = match handler.handle(&job).await {
                Ok(()) => {
                    debug!(kind = job.kind(), "Job completed");
                    metrics::record_job(job.kind(), "ok");
                    JobOutcome::Completed
                }
                Err(e) => {
                    warn!(kind = job.kind(), error = %e, "Job failed");
                    metrics::record_job(job.kind(), "failed");
                    JobOutcome::Failed(e.to_string())
                }
            };
            let _ = reply.send(outcome);
        }
        debug!("Job worker stopped");
    }

    /// Queue a job without waiting. A full queue drops the job.
    pub fn submit(&self, job: Job) -> JobTicket {
        let (reply, rx) = oneshot::channel();
        let kind = job.kind();

        if let Err(e) = self.tx.try_send(Envelope { job, reply }) {
            warn!(kind, error = %e, "Job dropped");
            metrics::record_job(kind, "dropped");
            // The envelope, and with it the reply sender, is dropped here, so
            // the ticket resolves to `Dropped`.
        }

        JobTicket(rx)
    }
}
