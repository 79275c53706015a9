pub mod derive;
pub mod state;

pub use derive::{derive, leagues, StatusCounts};
pub use state::ViewState;
