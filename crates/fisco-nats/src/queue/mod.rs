//! Durable work queue for OCR job dispatch.
//!
//! The queue carries only job IDs; the job row in the relational store is
//! the source of truth for all state. Messages are acknowledged explicitly
//! and redelivered after the acknowledgement window when a worker dies.

mod job_message;
mod ocr_queue;

pub use job_message::JobMessage;
pub use ocr_queue::{DeliveredJob, JobStream, OcrQueue};
