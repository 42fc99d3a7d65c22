//! Custom PostgreSQL types used by the job store.

mod enums;

pub use enums::{DocumentType, ProcessingStatus};
