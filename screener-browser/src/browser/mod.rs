//! Browser control module.

pub mod pool;
pub mod session;
pub mod wait;

pub use pool::{ManagedSession, SessionLauncher, SessionPool, WorkerId};
pub use session::{BrowserSession, ChromeLauncher};
pub use wait::{navigate_and_wait, poll_until};
