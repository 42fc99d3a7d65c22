//! Enumeration types mapped to PostgreSQL enums.

mod document_type;
mod processing_status;

pub use document_type::DocumentType;
pub use processing_status::ProcessingStatus;
