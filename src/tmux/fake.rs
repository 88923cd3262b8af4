//! In-memory tmux used by the engine tests.

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::HashMap;

use super::{ClientContext, LivePane, LiveWindow, Multiplexer, Spawned};
use crate::config::OptionStore;

#[derive(Debug, Clone, Default)]
pub struct FakePane {
    pub id: String,
    pub active: bool,
    pub path: String,
    pub pid: u32,
    pub sent: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWindow {
    pub id: String,
    /// tmux window index; kill-window leaves gaps
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub zoomed: bool,
    pub layout: String,
    pub panes: Vec<FakePane>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    pub name: String,
    pub windows: Vec<FakeWindow>,
}

#[derive(Debug, Default)]
struct State {
    sessions: Vec<FakeSession>,
    client: Option<ClientContext>,
    commands: HashMap<u32, String>,
    options: HashMap<String, String>,
    /// Operations that error out instead of taking effect
    broken: Vec<String>,
    calls: Vec<String>,
    next_id: u32,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn new_pane(&mut self, path: Option<&str>) -> FakePane {
        let n = self.next();
        FakePane {
            id: format!("%{}", n),
            active: true,
            path: path.unwrap_or("/").to_string(),
            pid: 1000 + n,
            sent: Vec::new(),
        }
    }

    fn new_window(&mut self, name: &str, path: Option<&str>) -> FakeWindow {
        let n = self.next();
        let pane = self.new_pane(path);
        FakeWindow {
            id: format!("@{}", n),
            index: 0,
            name: name.to_string(),
            active: true,
            zoomed: false,
            layout: String::new(),
            panes: vec![pane],
        }
    }

    fn session_mut(&mut self, name: &str) -> Result<&mut FakeSession> {
        match self.sessions.iter_mut().find(|s| s.name == name) {
            Some(session) => Ok(session),
            None => bail!("can't find session: {}", name),
        }
    }

    fn window_mut(&mut self, window_id: &str) -> Result<&mut FakeWindow> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.id == window_id)
            .ok_or_else(|| anyhow::anyhow!("can't find window: {}", window_id))
    }

    fn pane_mut(&mut self, pane_id: &str) -> Result<&mut FakePane> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .flat_map(|w| w.panes.iter_mut())
            .find(|p| p.id == pane_id)
            .ok_or_else(|| anyhow::anyhow!("can't find pane: {}", pane_id))
    }

    fn window_of_pane(&mut self, pane_id: &str) -> Result<&mut FakeWindow> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.panes.iter().any(|p| p.id == pane_id))
            .ok_or_else(|| anyhow::anyhow!("can't find pane: {}", pane_id))
    }
}

/// Records every mutating call as a tmux-like command line
#[derive(Debug, Default)]
pub struct FakeMux {
    state: RefCell<State>,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live session: one window per entry, one pane per path
    pub fn with_session(self, name: &str, windows: &[(&str, &[&str])]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let mut session = FakeSession {
                name: name.to_string(),
                windows: Vec::new(),
            };
            for (i, (window_name, paths)) in windows.iter().enumerate() {
                let mut window = state.new_window(window_name, paths.first().copied());
                window.index = i as u32;
                window.active = i == 0;
                for path in paths.iter().skip(1) {
                    let mut pane = state.new_pane(Some(*path));
                    pane.active = false;
                    window.panes.push(pane);
                }
                session.windows.push(window);
            }
            state.sessions.push(session);
        }
        self
    }

    /// Attach the invoking client to the first window/pane of `session`
    pub fn attached_to(self, session: &str) -> Self {
        self.attached_at(session, 0)
    }

    /// Attach the invoking client to the first pane of the `position`th window
    pub fn attached_at(self, session: &str, position: usize) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let context = state
                .sessions
                .iter_mut()
                .find(|s| s.name == session)
                .and_then(|s| {
                    for (i, window) in s.windows.iter_mut().enumerate() {
                        window.active = i == position;
                    }
                    s.windows.get(position)
                })
                .and_then(|w| w.panes.first().map(|p| (w.id.clone(), p.id.clone())));
            if let Some((window_id, pane_id)) = context {
                state.client = Some(ClientContext {
                    session: session.to_string(),
                    window_id,
                    pane_id,
                });
            }
        }
        self
    }

    pub fn with_command(self, pid: u32, command: &str) -> Self {
        self.state
            .borrow_mut()
            .commands
            .insert(pid, command.to_string());
        self
    }

    pub fn with_option(self, name: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .options
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Make `operation` (e.g. "switch-client") fail from now on
    pub fn with_broken(self, operation: &str) -> Self {
        self.state.borrow_mut().broken.push(operation.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn session(&self, name: &str) -> Option<FakeSession> {
        self.state
            .borrow()
            .sessions
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    pub fn session_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .sessions
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn client(&self) -> Option<ClientContext> {
        self.state.borrow().client.clone()
    }

    /// Mutate a window directly, outside the recorded call log
    pub fn edit_window(&self, window_id: &str, edit: impl FnOnce(&mut FakeWindow)) {
        if let Ok(window) = self.state.borrow_mut().window_mut(window_id) {
            edit(window);
        }
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.state.borrow().broken.iter().any(|b| b == operation) {
            bail!("{} failed", operation);
        }
        Ok(())
    }
}

impl Multiplexer for FakeMux {
    async fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.session_names())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<LiveWindow>> {
        let mut state = self.state.borrow_mut();
        let session = state.session_mut(session)?;
        Ok(session
            .windows
            .iter()
            .map(|w| LiveWindow {
                id: w.id.clone(),
                index: w.index,
                name: w.name.clone(),
                active: w.active,
                zoomed: w.zoomed,
                layout: w.layout.clone(),
            })
            .collect())
    }

    async fn list_panes(&self, window_id: &str) -> Result<Vec<LivePane>> {
        let mut state = self.state.borrow_mut();
        let window = state.window_mut(window_id)?;
        Ok(window
            .panes
            .iter()
            .enumerate()
            .map(|(index, p)| LivePane {
                id: p.id.clone(),
                index: index as u32,
                active: p.active,
                path: p.path.clone(),
                pid: p.pid,
            })
            .collect())
    }

    async fn current(&self) -> Result<Option<ClientContext>> {
        self.check("current")?;
        Ok(self.client())
    }

    async fn child_command(&self, pid: u32) -> Result<Option<String>> {
        Ok(self.state.borrow().commands.get(&pid).cloned())
    }

    async fn new_session(&self, name: &str, start_dir: Option<&str>) -> Result<Spawned> {
        self.record(format!("new-session {} {}", name, start_dir.unwrap_or("-")));
        let mut state = self.state.borrow_mut();
        if state.sessions.iter().any(|s| s.name == name) {
            bail!("duplicate session: {}", name);
        }
        let window = state.new_window("shell", start_dir);
        let spawned = Spawned {
            window_id: window.id.clone(),
            pane_id: window.panes[0].id.clone(),
        };
        state.sessions.push(FakeSession {
            name: name.to_string(),
            windows: vec![window],
        });
        Ok(spawned)
    }

    async fn kill_session(&self, name: &str) -> Result<()> {
        self.record(format!("kill-session {}", name));
        let mut state = self.state.borrow_mut();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.name != name);
        if state.sessions.len() == before {
            bail!("can't find session: {}", name);
        }
        if state.client.as_ref().is_some_and(|c| c.session == name) {
            state.client = None;
        }
        Ok(())
    }

    async fn new_window(
        &self,
        after_window_id: &str,
        name: &str,
        start_dir: Option<&str>,
    ) -> Result<Spawned> {
        let owner = self
            .state
            .borrow()
            .sessions
            .iter()
            .find(|s| s.windows.iter().any(|w| w.id == after_window_id))
            .map(|s| s.name.clone());
        self.record(format!(
            "new-window {} {}",
            owner.as_deref().unwrap_or(after_window_id),
            name
        ));
        let Some(owner) = owner else {
            bail!("can't find window: {}", after_window_id);
        };

        let mut state = self.state.borrow_mut();
        let mut window = state.new_window(name, start_dir);
        window.active = false;
        let spawned = Spawned {
            window_id: window.id.clone(),
            pane_id: window.panes[0].id.clone(),
        };

        let session = state.session_mut(&owner)?;
        let slot = session
            .windows
            .iter()
            .find(|w| w.id == after_window_id)
            .map_or(0, |w| w.index + 1);
        if session.windows.iter().any(|w| w.index == slot) {
            for later in session.windows.iter_mut().filter(|w| w.index >= slot) {
                later.index += 1;
            }
        }
        window.index = slot;
        session.windows.push(window);
        session.windows.sort_by_key(|w| w.index);
        Ok(spawned)
    }

    async fn rename_window(&self, window_id: &str, name: &str) -> Result<()> {
        self.record(format!("rename-window {} {}", window_id, name));
        self.state.borrow_mut().window_mut(window_id)?.name = name.to_string();
        Ok(())
    }

    async fn select_window(&self, window_id: &str) -> Result<()> {
        self.record(format!("select-window {}", window_id));
        let mut state = self.state.borrow_mut();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.windows.iter().any(|w| w.id == window_id))
            .ok_or_else(|| anyhow::anyhow!("can't find window: {}", window_id))?;
        for window in &mut session.windows {
            window.active = window.id == window_id;
        }
        Ok(())
    }

    async fn kill_window(&self, window_id: &str) -> Result<()> {
        self.record(format!("kill-window {}", window_id));
        let mut state = self.state.borrow_mut();
        for session in &mut state.sessions {
            if let Some(pos) = session.windows.iter().position(|w| w.id == window_id) {
                session.windows.remove(pos);
                return Ok(());
            }
        }
        bail!("can't find window: {}", window_id)
    }

    async fn select_layout(&self, window_id: &str, layout: &str) -> Result<()> {
        self.record(format!("select-layout {} {}", window_id, layout));
        self.state.borrow_mut().window_mut(window_id)?.layout = layout.to_string();
        Ok(())
    }

    async fn split_window(&self, window_id: &str, start_dir: Option<&str>) -> Result<String> {
        self.record(format!("split-window {} {}", window_id, start_dir.unwrap_or("-")));
        let mut state = self.state.borrow_mut();
        let mut pane = state.new_pane(start_dir);
        pane.active = false;
        let id = pane.id.clone();
        state.window_mut(window_id)?.panes.push(pane);
        Ok(id)
    }

    async fn select_pane(&self, pane_id: &str) -> Result<()> {
        self.record(format!("select-pane {}", pane_id));
        let mut state = self.state.borrow_mut();
        let window = state.window_of_pane(pane_id)?;
        for pane in &mut window.panes {
            pane.active = pane.id == pane_id;
        }
        Ok(())
    }

    async fn kill_pane(&self, pane_id: &str) -> Result<()> {
        self.record(format!("kill-pane {}", pane_id));
        let mut state = self.state.borrow_mut();
        let window = state.window_of_pane(pane_id)?;
        window.panes.retain(|p| p.id != pane_id);
        Ok(())
    }

    async fn zoom_pane(&self, pane_id: &str) -> Result<()> {
        self.record(format!("zoom-pane {}", pane_id));
        self.state.borrow_mut().window_of_pane(pane_id)?.zoomed = true;
        Ok(())
    }

    async fn send_line(&self, pane_id: &str, line: &str) -> Result<()> {
        self.record(format!("send-keys {} {}", pane_id, line));
        self.state
            .borrow_mut()
            .pane_mut(pane_id)?
            .sent
            .push(line.to_string());
        Ok(())
    }

    async fn switch_client(&self, target: &str) -> Result<()> {
        self.record(format!("switch-client {}", target));
        self.check("switch-client")?;
        let mut state = self.state.borrow_mut();
        let name = target.strip_prefix('=').unwrap_or(target);
        let context = {
            let session = state
                .sessions
                .iter()
                .find(|s| {
                    s.name == name
                        || s.windows.iter().any(|w| {
                            w.id == target || w.panes.iter().any(|p| p.id == target)
                        })
                })
                .ok_or_else(|| anyhow::anyhow!("can't find session: {}", target))?;
            let window = session
                .windows
                .iter()
                .find(|w| w.active)
                .or_else(|| session.windows.first())
                .ok_or_else(|| anyhow::anyhow!("empty session: {}", session.name))?;
            let pane = window
                .panes
                .iter()
                .find(|p| p.active)
                .or_else(|| window.panes.first())
                .ok_or_else(|| anyhow::anyhow!("empty window: {}", window.id))?;
            ClientContext {
                session: session.name.clone(),
                window_id: window.id.clone(),
                pane_id: pane.id.clone(),
            }
        };
        state.client = Some(context);
        Ok(())
    }

    async fn display_message(&self, message: &str) -> Result<()> {
        self.record(format!("display-message {}", message));
        Ok(())
    }
}

impl OptionStore for FakeMux {
    async fn get_option(&self, name: &str) -> Result<Option<String>> {
        Ok(self.state.borrow().options.get(name).cloned())
    }
}
