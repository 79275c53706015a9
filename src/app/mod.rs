pub mod input;
pub mod runtime;
pub mod state;

pub use input::{parse_command, Command, HELP};
pub use runtime::Dashboard;
pub use state::{App, AppState, Effect, RenderFrame, SyncTrigger};
