//! This module defines the alerts the periodic progress task posts to the
//! session driving it.
//!
//! Communication of alerts is performed via unbounded [tokio::sync::mpsc]
//! channels. The session renders [`Alert::Stats`] however it likes (the
//! animated bar is one option, plain logging another) and tears the
//! engine down on the two terminal alerts.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::engine::EngineError;
use crate::progress::ProgressSample;

/// The channel on which the progress task posts alerts to the session.
pub type AlertSender = UnboundedSender<Alert>;
/// The channel on which the session listens for alerts.
pub type AlertReceiver = UnboundedReceiver<Alert>;

/// Creates the alert channel pair for one session.
pub fn alert_channel() -> (AlertSender, AlertReceiver) {
    mpsc::unbounded_channel()
}

/// An alert posted by the periodic progress task.
#[derive(Debug)]
pub enum Alert {
    /// A fresh progress sample, posted once per tick.
    Stats(ProgressSample),
    /// The selection finished downloading. Posted exactly once; the task
    /// has stopped itself by the time this is received.
    Complete,
    /// The engine ran into a runtime failure; the task has stopped.
    Error(EngineError),
}
