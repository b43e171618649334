//! Domain models for the tutor service.

pub mod question;

pub use question::{HistoryEntry, NewQaRecord, QaRecord};
