use std::sync::mpsc;

use tracing::info;

/// One line of user-facing session output.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleLine {
    pub text: String,
    /// Indentation relative to the session's base level.
    pub indent: i32,
    /// Progress lines the host may overwrite instead of keeping.
    pub transient: bool,
}

/// Destination for progress and diagnostic lines.
///
/// Implementations are shared between the worker and the presentation
/// side, so they must serialize access themselves.
pub trait Console: Send + Sync {
    fn message(&self, text: &str, indent_delta: i32, transient: bool);
}

/// Forwards console lines to `tracing` at info level, for headless runs.
pub struct TracingConsole;

impl Console for TracingConsole {
    fn message(&self, text: &str, indent_delta: i32, transient: bool) {
        info!(indent = indent_delta, transient, "{text}");
    }
}

/// Sends console lines over a channel to a single consumer thread.
pub struct ChannelConsole {
    tx: mpsc::Sender<ConsoleLine>,
}

impl ChannelConsole {
    pub fn new(tx: mpsc::Sender<ConsoleLine>) -> Self {
        Self { tx }
    }

    /// A console and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::Receiver<ConsoleLine>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl Console for ChannelConsole {
    fn message(&self, text: &str, indent_delta: i32, transient: bool) {
        // A dropped receiver means nobody is listening any more
        let _ = self.tx.send(ConsoleLine {
            text: text.to_string(),
            indent: indent_delta,
            transient,
        });
    }
}
