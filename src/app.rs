use anyhow::Result;
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::chooser::{self, Picker};
use crate::config::Config;
use crate::document::{Merge, SessionDocument};
use crate::restore::{RestoreReport, Restorer};
use crate::snapshot;
use crate::tmux::{session_target, Multiplexer};

pub const MSG_SAVED_ALL: &str = "SESSIONS SAVED";
pub const MSG_SAVED: &str = "SESSION SAVED";
pub const MSG_RESTORED: &str = "SESSION(S) RESTORED";
pub const MSG_REVERTED: &str = "SESSION REVERTED";
pub const MSG_DELETED: &str = "SESSION DELETED";
pub const MSG_NOTHING_CHOSEN: &str = "NO SESSION SELECTED";
pub const MSG_NO_SESSION: &str = "NOT IN A SESSION";

/// Main application state
pub struct App<M, P> {
    mux: M,
    picker: P,
    config: Config,
}

impl<M: Multiplexer, P: Picker> App<M, P> {
    pub fn new(mux: M, picker: P, config: Config) -> Self {
        Self {
            mux,
            picker,
            config,
        }
    }

    #[cfg(test)]
    pub fn mux(&self) -> &M {
        &self.mux
    }

    /// Handle an action and return the status message to show
    pub async fn handle_action(&self, action: Action) -> Result<String> {
        debug!(?action, file = %self.config.session_file.display(), "handling action");
        match action {
            Action::SaveAll => self.save_all().await,
            Action::Update => self.update().await,
            Action::Revert => self.revert().await,
            Action::Delete => self.delete().await,
            Action::RestoreAll { force } => self.restore_all(force).await,
            Action::RestoreOne { name, force } => self.restore_one(&name, force).await,
            Action::Choose => self.choose().await,
        }
    }

    /// Show a message on the tmux status line
    pub async fn notify(&self, message: &str) {
        if let Err(e) = self.mux.display_message(message).await {
            debug!(error = %e, "could not display message");
        }
    }

    fn load(&self) -> Result<SessionDocument> {
        Ok(SessionDocument::load(&self.config.session_file)?)
    }

    fn store(&self, doc: &SessionDocument) -> Result<()> {
        Ok(doc.save(&self.config.session_file)?)
    }

    async fn current_session(&self) -> Result<Option<String>> {
        Ok(self.mux.current().await?.map(|c| c.session))
    }

    async fn save_all(&self) -> Result<String> {
        let current = self.current_session().await?;
        let mut doc = self.load()?;

        doc.clear_active();
        for record in snapshot::capture_all(&self.mux, current.as_deref()).await? {
            let name = record.name.clone();
            let merge = doc.upsert(record);
            debug!(session = %name, ?merge, "merged session");
        }

        self.store(&doc)?;
        info!(sessions = doc.sessions.len(), "saved all sessions");
        Ok(MSG_SAVED_ALL.to_string())
    }

    async fn update(&self) -> Result<String> {
        let Some(current) = self.current_session().await? else {
            return Ok(MSG_NO_SESSION.to_string());
        };

        let record = snapshot::capture_session(&self.mux, &current, true).await?;
        let mut doc = self.load()?;
        doc.clear_active();
        let merge = doc.upsert(record);
        self.store(&doc)?;

        if merge == Merge::Appended {
            info!(session = %current, "saved new session");
        } else {
            info!(session = %current, "updated saved session");
        }
        Ok(MSG_SAVED.to_string())
    }

    async fn revert(&self) -> Result<String> {
        let Some(current) = self.current_session().await? else {
            return Ok(MSG_NO_SESSION.to_string());
        };

        let doc = self.load()?;
        let report = Restorer::new(&self.mux, &self.config)
            .restore_one(&doc, &current, true)
            .await?;
        Ok(with_failures(MSG_REVERTED, &report))
    }

    async fn delete(&self) -> Result<String> {
        let Some(current) = self.current_session().await? else {
            return Ok(MSG_NO_SESSION.to_string());
        };

        let mut doc = self.load()?;
        if doc.remove(&current).is_none() {
            warn!(session = %current, "session was never saved");
        }
        self.store(&doc)?;

        // Move the client off before the session disappears under it
        let live = self.mux.list_sessions().await?;
        if let Some(other) = live.iter().find(|s| **s != current) {
            if let Err(e) = self.mux.switch_client(&session_target(other)).await {
                debug!(error = %e, "could not switch away");
            }
        }
        if let Err(e) = self.mux.kill_session(&current).await {
            debug!(error = %e, "could not kill session");
        }

        info!(session = %current, "deleted session");
        Ok(MSG_DELETED.to_string())
    }

    async fn restore_all(&self, force: bool) -> Result<String> {
        let doc = self.load()?;
        let report = Restorer::new(&self.mux, &self.config)
            .restore_all(&doc, force)
            .await?;
        Ok(with_failures(MSG_RESTORED, &report))
    }

    async fn restore_one(&self, name: &str, force: bool) -> Result<String> {
        let doc = self.load()?;
        let report = Restorer::new(&self.mux, &self.config)
            .restore_one(&doc, name, force)
            .await?;
        Ok(with_failures(MSG_RESTORED, &report))
    }

    async fn choose(&self) -> Result<String> {
        let doc = self.load()?;
        let live = self.mux.list_sessions().await?;
        let menu = chooser::menu(&doc.names(), &live);

        let Some(line) = self.picker.pick(&menu, chooser::HEADER).await? else {
            return Ok(MSG_NOTHING_CHOSEN.to_string());
        };
        let name = chooser::strip_annotation(&line);

        let report = Restorer::new(&self.mux, &self.config)
            .restore_one(&doc, name, false)
            .await?;
        Ok(with_failures(MSG_RESTORED, &report))
    }
}

fn with_failures(message: &str, report: &RestoreReport) -> String {
    if report.failed_steps == 0 {
        message.to_string()
    } else {
        format!("{} ({} STEPS FAILED)", message, report.failed_steps)
    }
}
