/// Actions that can be dispatched through the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pick a session interactively and restore it
    Choose,
    /// Save the current session
    Update,
    /// Rebuild the current session from its saved record
    Revert,
    /// Forget the current session and kill it
    Delete,
    /// Save every running session
    SaveAll,
    /// Restore every saved session
    RestoreAll { force: bool },
    /// Restore one saved session by name
    RestoreOne { name: String, force: bool },
}

impl Action {
    /// Whether the action runs long enough to show a spinner
    pub fn shows_progress(&self) -> bool {
        !matches!(self, Action::Choose | Action::Delete)
    }
}
