//! Structured logging and audit output.

mod format;

pub use format::{AuditRecord, StructuredLogger};
