//! The persisted session document and its records.

mod merge;
mod store;

pub use merge::Merge;

use serde::{Deserialize, Serialize};

/// Every known session, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub name: String,
    /// The session the saving client was attached to
    pub active: bool,
    pub windows: Vec<WindowRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowRecord {
    /// 0 is the window tmux creates with the session
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub zoomed: bool,
    /// tmux layout descriptor, applied verbatim on restore
    pub layout: String,
    pub panes: Vec<PaneRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneRecord {
    /// 0 is the pane tmux creates with the window
    pub index: u32,
    pub active: bool,
    pub path: String,
    /// Foreground command line, empty when the shell was idle
    pub command: String,
}

impl SessionRecord {
    /// Windows in ascending index order
    pub fn ordered_windows(&self) -> Vec<&WindowRecord> {
        let mut windows: Vec<&WindowRecord> = self.windows.iter().collect();
        windows.sort_by_key(|w| w.index);
        windows
    }

    /// Path of the first pane of the first window, used as the start directory
    pub fn start_path(&self) -> Option<&str> {
        let window = *self.ordered_windows().first()?;
        let pane = *window.ordered_panes().first()?;
        Some(pane.path.as_str()).filter(|p| !p.is_empty())
    }
}

impl WindowRecord {
    /// Panes in ascending index order
    pub fn ordered_panes(&self) -> Vec<&PaneRecord> {
        let mut panes: Vec<&PaneRecord> = self.panes.iter().collect();
        panes.sort_by_key(|p| p.index);
        panes
    }
}
