use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::console::Console;
use crate::frame::FrameDescriptor;
use crate::io::FrameStore;

use super::config::SessionConfig;
use super::orchestrator::run_session;
use super::types::{CancelFlag, SessionOutcome};

/// Run a session on a dedicated worker thread.
///
/// The host keeps its own thread free to drain the console and to set the
/// cancel flag; the outcome comes back through the join handle.
pub fn spawn_session(
    descriptors: Vec<FrameDescriptor>,
    config: SessionConfig,
    store: Arc<dyn FrameStore>,
    console: Arc<dyn Console>,
    cancel: CancelFlag,
) -> std::io::Result<JoinHandle<SessionOutcome>> {
    thread::Builder::new()
        .name("darkmaker-session".into())
        .spawn(move || {
            run_session(
                descriptors,
                &config,
                store.as_ref(),
                console.as_ref(),
                &cancel,
            )
        })
}
