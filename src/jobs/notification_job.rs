//! Background notification delivery.
//!
//! Request handlers enqueue jobs and return immediately. A single worker
//! task owns the receiving end and outlives any request, so a client
//! disconnect never cancels delivery. Delivery is at-most-once: failures
//! are logged and the job is discarded.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::domain::{OtpCode, User};
use crate::infra::Notifier;

/// Work for the notification worker.
#[derive(Debug, Clone)]
pub enum NotificationJob {
    /// Deliver an OTP code
    SendOtp { user: User, code: OtpCode },
    /// Register a newly created user with the provider
    Identify { user: User },
}

impl NotificationJob {
    fn kind(&self) -> &'static str {
        match self {
            NotificationJob::SendOtp { .. } => "send_otp",
            NotificationJob::Identify { .. } => "identify",
        }
    }

    fn user(&self) -> &User {
        match self {
            NotificationJob::SendOtp { user, .. } | NotificationJob::Identify { user } => user,
        }
    }
}

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Bounded queue and its receiving end.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. A full or closed queue drops the job.
    pub fn enqueue(&self, job: NotificationJob) {
        match self.sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                tracing::warn!(
                    kind = job.kind(),
                    user_id = %job.user().id,
                    "Notification queue full, job dropped"
                );
            }
            Err(TrySendError::Closed(job)) => {
                tracing::warn!(
                    kind = job.kind(),
                    user_id = %job.user().id,
                    "Notification queue closed, job dropped"
                );
            }
        }
    }
}

/// Handle to the running worker task.
pub struct NotificationWorker {
    handle: JoinHandle<()>,
}

impl NotificationWorker {
    /// Spawn the worker. It runs until every queue handle is dropped and
    /// the remaining jobs are processed.
    pub fn spawn(
        receiver: mpsc::Receiver<NotificationJob>,
        notifier: Arc<dyn Notifier>,
        concurrency: usize,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tracing::info!(concurrency, "Notification worker started");

            futures::stream::unfold(receiver, |mut rx| async move {
                rx.recv().await.map(|job| (job, rx))
            })
            .for_each_concurrent(concurrency.max(1), |job| {
                let notifier = notifier.clone();
                async move { process(notifier.as_ref(), job).await }
            })
            .await;

            tracing::info!("Notification worker stopped");
        });

        Self { handle }
    }

    /// Wait for the worker to drain, aborting it after `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        let abort = self.handle.abort_handle();
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Notification worker panicked"),
            Err(_) => {
                tracing::warn!("Notification worker did not drain in time, aborting");
                abort.abort();
            }
        }
    }
}

/// Spawn a worker and return the queue that feeds it.
pub fn start(
    notifier: Arc<dyn Notifier>,
    capacity: usize,
    concurrency: usize,
) -> (NotificationQueue, NotificationWorker) {
    let (queue, receiver) = NotificationQueue::new(capacity);
    let worker = NotificationWorker::spawn(receiver, notifier, concurrency);
    (queue, worker)
}

async fn process(notifier: &dyn Notifier, job: NotificationJob) {
    let kind = job.kind();
    let user_id = job.user().id;

    let result = match &job {
        NotificationJob::SendOtp { user, code } => notifier.send_otp(user, code).await,
        NotificationJob::Identify { user } => notifier.identify(user).await,
    };

    match result {
        Ok(()) => tracing::debug!(kind, user_id = %user_id, "Notification job completed"),
        Err(e) => tracing::error!(kind, user_id = %user_id, error = %e, "Notification job failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    use crate::domain::UserRole;
    use crate::errors::AppError;
    use crate::infra::MockNotifier;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "hashed".to_string(),
            name: "Jane".to_string(),
            phone_code: None,
            phone_number: None,
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_and_drains() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();

        let mut notifier = MockNotifier::new();
        notifier.expect_send_otp().times(3).returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let (queue, worker) = start(Arc::new(notifier), 8, 2);
        for _ in 0..3 {
            queue.enqueue(NotificationJob::SendOtp {
                user: user(),
                code: OtpCode::generate(4),
            });
        }
        drop(queue);

        worker.shutdown(Duration::from_secs(5)).await;
        assert_eq!(sent.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_worker() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_identify()
            .times(2)
            .returning(|_| Err(AppError::ServiceUnavailable("novu".to_string())));

        let (queue, worker) = start(Arc::new(notifier), 8, 1);
        queue.enqueue(NotificationJob::Identify { user: user() });
        queue.enqueue(NotificationJob::Identify { user: user() });
        drop(queue);

        worker.shutdown(Duration::from_secs(5)).await;
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (queue, mut receiver) = NotificationQueue::new(1);

        queue.enqueue(NotificationJob::Identify { user: user() });
        queue.enqueue(NotificationJob::Identify { user: user() });
        drop(queue);

        assert!(receiver.recv().await.is_some());
        assert!(receiver.recv().await.is_none());
    }
}
