// Library interface for ggnav (commit graph navigation)
// This exposes modules for integration testing

pub mod config;
pub mod detail;
pub mod error;
pub mod gate;
pub mod graph;
pub mod layout;
pub mod loader;
pub mod logging;
pub mod resolver;
pub mod session;
pub mod sha;
pub mod transport;
pub mod tree;

// Re-export commonly used types for easier testing
pub use error::{FetchError, NavError};
pub use gate::LoadGate;
pub use resolver::{CommitResolver, LoadOutcome, Resolution, SearchHit};
pub use session::{Notice, Session, SessionConfig};
pub use sha::Sha;
pub use transport::{FetchStatus, Fetched, Transport};
pub use tree::{SelectOutcome, TreeNavigator};
