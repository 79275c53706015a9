pub mod api_football;
pub mod provider;
pub mod retry;
pub mod scheduler;
pub mod sports_db;

pub use provider::{normalize, normalize_batch, NormalizedBatch, ProviderEndpoint, RecordOutcome};
pub use retry::with_retry;
pub use scheduler::{HttpTransport, ProviderRequest, RequestScheduler, Transport};
