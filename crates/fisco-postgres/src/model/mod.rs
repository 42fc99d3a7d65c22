//! Database models for the job store.

mod document_job;

pub use document_job::{DocumentJob, NewDocumentJob};
