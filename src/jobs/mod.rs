//! Background jobs.

pub mod notification_job;

pub use notification_job::{start, NotificationJob, NotificationQueue, NotificationWorker};
