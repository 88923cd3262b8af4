//! Rebuild live tmux sessions from document records.
//!
//! Population is strictly ordered: windows in ascending index, then panes in
//! ascending index within each window. Later splits and layouts depend on the
//! earlier panes existing, so nothing here runs concurrently.
//!
//! Individual tmux steps are best effort. A failed step is logged at debug
//! level, counted in the [`RestoreReport`], and the pass carries on.

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::document::{SessionDocument, SessionRecord, WindowRecord};
use crate::tmux::sanitize;
use crate::tmux::{session_target, ClientContext, Multiplexer, Spawned};

/// What a restore pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Sessions that were created or repopulated
    pub restored: Vec<String>,
    /// Live sessions left untouched because `force` was off
    pub skipped: Vec<String>,
    /// Target the client was switched to
    pub focused: Option<String>,
    /// tmux steps that failed and were skipped
    pub failed_steps: usize,
}

/// Where the command was launched from, measured before anything changes
#[derive(Debug, Clone)]
struct Origin {
    context: ClientContext,
    /// Only one session, window and pane existed
    sole: bool,
}

/// Live IDs of a populated session's active window and pane
#[derive(Debug, Clone, Default)]
struct Placed {
    window_id: Option<String>,
    pane_id: Option<String>,
}

#[derive(Debug, Clone)]
struct Focus {
    session: String,
    placed: Placed,
}

impl Focus {
    fn target(&self) -> String {
        self.placed
            .pane_id
            .clone()
            .or_else(|| self.placed.window_id.clone())
            .unwrap_or_else(|| session_target(&self.session))
    }
}

pub struct Restorer<'a, M> {
    mux: &'a M,
    config: &'a Config,
    report: RestoreReport,
}

impl<'a, M: Multiplexer> Restorer<'a, M> {
    pub fn new(mux: &'a M, config: &'a Config) -> Self {
        Self {
            mux,
            config,
            report: RestoreReport::default(),
        }
    }

    /// Restore a single session by name.
    ///
    /// A live session is simply switched to unless `force` is set. A name the
    /// document does not know touches nothing.
    pub async fn restore_one(
        mut self,
        doc: &SessionDocument,
        name: &str,
        force: bool,
    ) -> Result<RestoreReport> {
        let live = self.mux.list_sessions().await?;

        if !force && live.iter().any(|s| s == name) {
            let target = session_target(name);
            let result = self.mux.switch_client(&target).await;
            if self.step("switch-client", result) {
                self.report.focused = Some(target);
            }
            return Ok(self.report);
        }

        let Some(record) = doc.find(name) else {
            debug!(session = name, "no saved session with that name");
            return Ok(self.report);
        };

        self.run(&[record], Some(name), force, &live).await?;
        Ok(self.report)
    }

    /// Restore every session in the document
    pub async fn restore_all(mut self, doc: &SessionDocument, force: bool) -> Result<RestoreReport> {
        let live = self.mux.list_sessions().await?;
        let records: Vec<&SessionRecord> = doc.sessions.iter().collect();
        self.run(&records, None, force, &live).await?;
        Ok(self.report)
    }

    async fn run(
        &mut self,
        records: &[&SessionRecord],
        requested: Option<&str>,
        force: bool,
        live: &[String],
    ) -> Result<()> {
        let mux = self.mux;
        let origin = self.origin(live).await;

        let mut focus: Option<Focus> = None;
        for record in records {
            let is_live = live.iter().any(|s| *s == record.name);

            let placed = if is_live && !force {
                debug!(session = %record.name, "already running, skipping");
                self.report.skipped.push(record.name.clone());
                Placed::default()
            } else {
                let invoking = origin
                    .as_ref()
                    .map(|o| &o.context)
                    .filter(|c| c.session == record.name);

                let populated = match invoking {
                    Some(context) => {
                        let base = self.clear_in_place(context).await;
                        Some(self.populate(record, base).await)
                    }
                    None => {
                        if is_live {
                            let result = mux.kill_session(&record.name).await;
                            self.step("kill-session", result);
                        }
                        self.create(record).await
                    }
                };

                let Some(placed) = populated else {
                    continue;
                };
                info!(session = %record.name, "restored session");
                self.report.restored.push(record.name.clone());
                placed
            };

            let wants_focus = match requested {
                Some(name) => record.name == name,
                None => focus.is_none() && record.active,
            };
            if wants_focus {
                focus = Some(Focus {
                    session: record.name.clone(),
                    placed,
                });
            }
        }

        let Some(focus) = focus else {
            debug!("nothing to focus");
            return Ok(());
        };

        let target = focus.target();
        let result = mux.switch_client(&target).await;
        if !self.step("switch-client", result) {
            return Ok(());
        }
        self.report.focused = Some(target);

        // Past this point the switch has landed
        if let Some(origin) = origin {
            let launch = &origin.context.session;
            if focus.session != *launch
                && origin.sole
                && sanitize::is_numeric_name(launch)
                && self.config.kill_launch_session
            {
                debug!(session = %launch, "removing throwaway launch session");
                let result = mux.kill_session(launch).await;
                self.step("kill-session", result);
            }
        }

        Ok(())
    }

    /// Where we were launched from. Failed queries are logged: no context
    /// means no origin, and an unmeasured session never counts as sole.
    async fn origin(&self, live: &[String]) -> Option<Origin> {
        let context = match self.mux.current().await {
            Ok(context) => context?,
            Err(e) => {
                debug!(error = %e, "could not read client context");
                return None;
            }
        };

        let windows = self.mux.list_windows(&context.session).await;
        let panes = self.mux.list_panes(&context.window_id).await;
        let sole = match (windows, panes) {
            (Ok(windows), Ok(panes)) => live.len() == 1 && windows.len() == 1 && panes.len() == 1,
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, "could not measure launch session");
                false
            }
        };

        Some(Origin { context, sole })
    }

    async fn create(&mut self, record: &SessionRecord) -> Option<Placed> {
        let result = self.mux.new_session(&record.name, record.start_path()).await;
        match result {
            Ok(base) => Some(self.populate(record, base).await),
            Err(e) => {
                self.fail("new-session", &e);
                None
            }
        }
    }

    /// Empty the session we are running in without killing our own pane
    async fn clear_in_place(&mut self, context: &ClientContext) -> Spawned {
        let mux = self.mux;

        match mux.list_windows(&context.session).await {
            Ok(windows) => {
                for window in windows.iter().filter(|w| w.id != context.window_id) {
                    let result = mux.kill_window(&window.id).await;
                    self.step("kill-window", result);
                }
            }
            Err(e) => self.fail("list-windows", &e),
        }

        match mux.list_panes(&context.window_id).await {
            Ok(panes) => {
                for pane in panes.iter().filter(|p| p.id != context.pane_id) {
                    let result = mux.kill_pane(&pane.id).await;
                    self.step("kill-pane", result);
                }
            }
            Err(e) => self.fail("list-panes", &e),
        }

        Spawned {
            window_id: context.window_id.clone(),
            pane_id: context.pane_id.clone(),
        }
    }

    /// Build windows and panes into a session whose first window/pane is `base`
    async fn populate(&mut self, record: &SessionRecord, base: Spawned) -> Placed {
        let mux = self.mux;
        let mut placed = Placed::default();
        let mut previous = base.window_id.clone();

        for window in record.ordered_windows() {
            let spawned = if window.index == 0 {
                let result = mux.select_window(&base.window_id).await;
                self.step("select-window", result);
                let result = mux.rename_window(&base.window_id, &window.name).await;
                self.step("rename-window", result);
                base.clone()
            } else {
                let start = window.ordered_panes().first().copied().map(|p| p.path.as_str());
                match mux.new_window(&previous, &window.name, start.filter(|p| !p.is_empty())).await {
                    Ok(spawned) => {
                        let result = mux.select_window(&spawned.window_id).await;
                        self.step("select-window", result);
                        spawned
                    }
                    Err(e) => {
                        self.fail("new-window", &e);
                        continue;
                    }
                }
            };

            previous = spawned.window_id.clone();
            let active_pane = self.populate_window(window, &spawned).await;
            if window.active || placed.window_id.is_none() {
                placed.window_id = Some(spawned.window_id.clone());
                placed.pane_id = active_pane;
            }
        }

        if let Some(window_id) = &placed.window_id {
            let result = mux.select_window(window_id).await;
            self.step("select-window", result);
        }
        if let Some(pane_id) = &placed.pane_id {
            let result = mux.select_pane(pane_id).await;
            self.step("select-pane", result);
        }

        placed
    }

    /// Create, replay, lay out and focus the panes of one window.
    ///
    /// Returns the live ID of the pane that should be active.
    async fn populate_window(&mut self, window: &WindowRecord, spawned: &Spawned) -> Option<String> {
        let mux = self.mux;

        let mut panes = Vec::new();
        for pane in window.ordered_panes() {
            if pane.index == 0 {
                panes.push((pane, spawned.pane_id.clone()));
                continue;
            }
            let start = Some(pane.path.as_str()).filter(|p| !p.is_empty());
            match mux.split_window(&spawned.window_id, start).await {
                Ok(id) => panes.push((pane, id)),
                Err(e) => self.fail("split-window", &e),
            }
        }

        for (pane, id) in &panes {
            if !pane.path.is_empty() {
                let cd = format!("cd {}", sanitize::quote_path(&pane.path));
                let result = mux.send_line(id, &cd).await;
                self.step("send-keys", result);
            }
            if !pane.command.is_empty() {
                let result = mux.send_line(id, &pane.command).await;
                self.step("send-keys", result);
            } else if !pane.path.is_empty() {
                let result = mux.send_line(id, "clear").await;
                self.step("send-keys", result);
            }
        }

        if !window.layout.is_empty() {
            let result = mux.select_layout(&spawned.window_id, &window.layout).await;
            self.step("select-layout", result);
        }

        let active = panes
            .iter()
            .find(|(pane, _)| pane.active)
            .or_else(|| panes.first())
            .map(|(_, id)| id.clone())?;

        let result = mux.select_pane(&active).await;
        self.step("select-pane", result);
        if window.zoomed {
            let result = mux.zoom_pane(&active).await;
            self.step("resize-pane", result);
        }

        Some(active)
    }

    /// Record the outcome of a best-effort step; true when it succeeded
    fn step(&mut self, what: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.fail(what, &e);
                false
            }
        }
    }

    fn fail(&mut self, what: &str, error: &anyhow::Error) {
        self.report.failed_steps += 1;
        debug!(step = what, error = %error, "tmux step failed");
    }
}
