mod client;
#[cfg(test)]
pub mod fake;
pub mod sanitize;

pub use client::TmuxClient;

use anyhow::Result;

/// A live tmux window as reported by `list-windows`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveWindow {
    /// Window ID (e.g., "@3")
    pub id: String,
    /// Index emitted by tmux (depends on base-index)
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub zoomed: bool,
    /// Layout descriptor, round-tripped verbatim
    pub layout: String,
}

/// A live tmux pane as reported by `list-panes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePane {
    /// Pane ID (e.g., "%7")
    pub id: String,
    pub index: u32,
    pub active: bool,
    /// Current working directory
    pub path: String,
    /// PID of the shell running in the pane
    pub pid: u32,
}

/// Where the invoking client currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub session: String,
    pub window_id: String,
    pub pane_id: String,
}

/// IDs of the window and pane tmux creates along with a new session or window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawned {
    pub window_id: String,
    pub pane_id: String,
}

/// Target string for a session that never matches by prefix
pub fn session_target(name: &str) -> String {
    format!("={}", name)
}

/// Live-state provider.
///
/// Every call is awaited in sequence by the engines; implementations do not
/// need to be `Send`. Windows and panes are addressed by their tmux IDs.
#[allow(async_fn_in_trait)]
pub trait Multiplexer {
    async fn list_sessions(&self) -> Result<Vec<String>>;
    async fn list_windows(&self, session: &str) -> Result<Vec<LiveWindow>>;
    async fn list_panes(&self, window_id: &str) -> Result<Vec<LivePane>>;

    /// `None` when not running inside a tmux client
    async fn current(&self) -> Result<Option<ClientContext>>;

    /// Command line of the foreground child of `pid`, if there is one
    async fn child_command(&self, pid: u32) -> Result<Option<String>>;

    async fn new_session(&self, name: &str, start_dir: Option<&str>) -> Result<Spawned>;
    async fn kill_session(&self, name: &str) -> Result<()>;

    /// Create a window at the index right after `after_window_id`, shifting
    /// later windows up if that index is taken
    async fn new_window(&self, after_window_id: &str, name: &str, start_dir: Option<&str>)
        -> Result<Spawned>;
    async fn rename_window(&self, window_id: &str, name: &str) -> Result<()>;
    async fn select_window(&self, window_id: &str) -> Result<()>;
    async fn kill_window(&self, window_id: &str) -> Result<()>;
    async fn select_layout(&self, window_id: &str, layout: &str) -> Result<()>;

    /// Split `window_id`, returning the new pane's ID
    async fn split_window(&self, window_id: &str, start_dir: Option<&str>) -> Result<String>;
    async fn select_pane(&self, pane_id: &str) -> Result<()>;
    async fn kill_pane(&self, pane_id: &str) -> Result<()>;
    async fn zoom_pane(&self, pane_id: &str) -> Result<()>;

    /// Type `line` literally into the pane and press Enter
    async fn send_line(&self, pane_id: &str, line: &str) -> Result<()>;

    async fn switch_client(&self, target: &str) -> Result<()>;
    async fn display_message(&self, message: &str) -> Result<()>;
}
