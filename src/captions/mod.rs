//! Caption persistence and the editing session built on it.

pub mod session;
pub mod store;

pub use session::{CaptionSession, SessionEvent, SessionState, WarningKind};
pub use store::{CaptionBackend, CaptionStore};
