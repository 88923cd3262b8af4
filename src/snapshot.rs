//! Capture live tmux sessions as document records.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::document::{PaneRecord, SessionRecord, WindowRecord};
use crate::tmux::sanitize;
use crate::tmux::{LivePane, Multiplexer};

/// Snapshot one live session.
///
/// Windows and panes are numbered by their position in tmux's listing, so
/// index 0 is always the window/pane tmux creates on its own.
pub async fn capture_session<M: Multiplexer>(
    mux: &M,
    name: &str,
    active: bool,
) -> Result<SessionRecord> {
    let live_windows = mux
        .list_windows(name)
        .await
        .with_context(|| format!("Failed to list windows of {}", name))?;

    let mut windows = Vec::with_capacity(live_windows.len());
    for (position, window) in live_windows.iter().enumerate() {
        let live_panes = mux
            .list_panes(&window.id)
            .await
            .with_context(|| format!("Failed to list panes of {}:{}", name, window.index))?;

        let mut panes = Vec::with_capacity(live_panes.len());
        for (pane_position, pane) in live_panes.iter().enumerate() {
            panes.push(capture_pane(mux, pane, pane_position as u32).await);
        }

        windows.push(WindowRecord {
            index: position as u32,
            name: window.name.clone(),
            active: window.active,
            zoomed: window.zoomed,
            layout: window.layout.clone(),
            panes,
        });
    }

    debug!(session = name, windows = windows.len(), "captured session");
    Ok(SessionRecord {
        name: name.to_string(),
        active,
        windows,
    })
}

async fn capture_pane<M: Multiplexer>(mux: &M, pane: &LivePane, index: u32) -> PaneRecord {
    let command = match mux.child_command(pane.pid).await {
        Ok(Some(raw)) => sanitize::clean_command(&raw),
        Ok(None) => String::new(),
        Err(e) => {
            warn!(pane = %pane.id, index = pane.index, error = %e, "could not read foreground command");
            String::new()
        }
    };

    PaneRecord {
        index,
        active: pane.active,
        path: pane.path.clone(),
        command,
    }
}

/// Snapshot every live session, marking `current` as the active one.
///
/// A session that fails to capture is logged and left out.
pub async fn capture_all<M: Multiplexer>(mux: &M, current: Option<&str>) -> Result<Vec<SessionRecord>> {
    let names = mux.list_sessions().await?;
    let mut records = Vec::with_capacity(names.len());
    for name in &names {
        match capture_session(mux, name, current == Some(name.as_str())).await {
            Ok(record) => records.push(record),
            Err(e) => warn!(session = %name, error = %e, "skipping session"),
        }
    }
    Ok(records)
}
