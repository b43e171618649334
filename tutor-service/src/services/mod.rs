pub mod database;
pub mod document_fetcher;
pub mod memory;
pub mod metrics;
pub mod providers;

pub use database::{QuestionStore, SupabaseConfig, SupabaseDb};
pub use document_fetcher::{DocumentFetcher, DownloadedDocument, FetchError};
pub use memory::InMemoryDb;
pub use metrics::{get_metrics, init_metrics};
