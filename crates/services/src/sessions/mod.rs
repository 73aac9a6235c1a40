mod progress;
mod session;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use session::TestSession;
pub use state::{LoadFailure, SessionState, SessionStatus};
pub use workflow::TestSessionService;
