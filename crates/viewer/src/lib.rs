//! Host-side contract for the embedded WebGL/Unity viewer.
//!
//! The viewer runtime owns its own event loop and resources; this crate only
//! describes what the host hands it (a mount target and a loader
//! configuration), what it hands back (progress, a running instance or an
//! error), and guarantees the instance is asked to quit before the mount
//! target goes away.
mod config;
mod directory;
mod session;

pub use config::{LoaderConfig, MountTarget, DEFAULT_CANVAS_ID};
pub use directory::{BuildDirectoryLoader, BuildInstance};
pub use session::{
    EmbedEvents, EmbedInstance, EmbedLoader, EmbedSession, NoopEvents, ViewerStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedLoadError {
    #[error("viewer loader unavailable: {0}")]
    LoaderUnavailable(String),
    #[error("viewer failed to start: {0}")]
    Startup(String),
    #[error("viewer teardown failed: {0}")]
    Teardown(String),
}
