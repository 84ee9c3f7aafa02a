//! Navigation signal raised after sign-in, sign-up and sign-out.

use std::sync::Mutex;

use tracing::debug;

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// Records every path it is sent to; the last entry is the current page.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.history().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        debug!(path, "Navigating");
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}
