//! Activity watching - detects start/stop transitions and dispatches them

mod poller;
mod state;

pub use poller::ActivityWatcher;
pub use state::ActivityState;
