pub mod orchestrator;

pub use orchestrator::{RetryPolicy, SyncOrchestrator, SyncReport, SyncSource};
