pub mod refresh_timer;

pub use refresh_timer::RefreshTimerWorker;
