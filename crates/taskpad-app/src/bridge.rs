//! Parameters handed from one screen to the next.
//!
//! Every payload is addressed to a screen and consumed exactly once, so
//! returning to a screen never replays an earlier payload.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use taskpad_core::{Task, TaskId, TaskUpdate};
use tracing::debug;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// The task list.
    List,
    /// The create/edit form.
    Form,
}

/// Payload carried by a navigation transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenParams {
    /// Form → list: append this task.
    NewTask(Task),
    /// List → form: prefill the form with this task.
    TaskToEdit(Task),
    /// Form → list: commit these changes.
    EditedTask {
        /// Task being edited.
        id: TaskId,
        /// Field replacements.
        update: TaskUpdate,
    },
}

/// Per-screen mailboxes of pending navigation payloads.
#[derive(Debug, Default)]
pub struct ScreenBridge {
    pending: HashMap<Screen, VecDeque<ScreenParams>>,
}

impl ScreenBridge {
    /// Create an empty bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a payload for `screen`.
    pub fn send(&mut self, screen: Screen, params: ScreenParams) {
        debug!(?screen, "queued screen payload");
        self.pending.entry(screen).or_default().push_back(params);
    }

    /// Take the oldest payload for `screen`, if any.
    pub fn take(&mut self, screen: Screen) -> Option<ScreenParams> {
        self.pending.get_mut(&screen).and_then(VecDeque::pop_front)
    }

    /// Number of payloads waiting for `screen`.
    #[must_use]
    pub fn pending(&self, screen: Screen) -> usize {
        self.pending.get(&screen).map_or(0, VecDeque::len)
    }
}
