use anyhow::{Context, Result};
use tokio::process::Command;

use super::{ClientContext, LivePane, LiveWindow, Multiplexer, Spawned};
use crate::config::OptionStore;

const SPAWNED_FORMAT: &str = "#{window_id}|#{pane_id}";

/// Client for interacting with tmux via CLI
pub struct TmuxClient {
    /// Path to tmux binary
    tmux_path: String,
}

impl TmuxClient {
    pub fn new() -> Self {
        Self {
            tmux_path: "tmux".to_string(),
        }
    }

    /// Run a tmux command and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.tmux_path)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute tmux {}", args[0]))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tmux {} failed: {}", args[0], stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn parse_spawned(stdout: &str) -> Result<Spawned> {
        let line = stdout.trim();
        let (window_id, pane_id) = line
            .split_once('|')
            .ok_or_else(|| anyhow::anyhow!("Unexpected tmux output: {}", line))?;
        Ok(Spawned {
            window_id: window_id.to_string(),
            pane_id: pane_id.to_string(),
        })
    }

    // Format: window_id|window_index|window_active|window_zoomed_flag|window_layout|window_name
    fn parse_window_line(line: &str) -> Option<LiveWindow> {
        let parts: Vec<&str> = line.splitn(6, '|').collect();
        if parts.len() < 6 {
            return None;
        }

        Some(LiveWindow {
            id: parts[0].to_string(),
            index: parts[1].parse().ok()?,
            active: parts[2] == "1",
            zoomed: parts[3] == "1",
            layout: parts[4].to_string(),
            name: parts[5].to_string(),
        })
    }

    // Format: pane_id|pane_index|pane_active|pane_pid|pane_current_path
    fn parse_pane_line(line: &str) -> Option<LivePane> {
        let parts: Vec<&str> = line.splitn(5, '|').collect();
        if parts.len() < 5 {
            return None;
        }

        Some(LivePane {
            id: parts[0].to_string(),
            index: parts[1].parse().ok()?,
            active: parts[2] == "1",
            pid: parts[3].parse().unwrap_or(0),
            path: parts[4].to_string(),
        })
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer for TmuxClient {
    /// List all tmux session names
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.tmux_path)
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .await
            .context("Failed to execute tmux list-sessions")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("no server running") || stderr.contains("no sessions") {
                return Ok(Vec::new());
            }
            anyhow::bail!("tmux list-sessions failed: {}", stderr);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<LiveWindow>> {
        let target = super::session_target(session);
        let stdout = self
            .run(&[
                "list-windows",
                "-t",
                target.as_str(),
                "-F",
                "#{window_id}|#{window_index}|#{window_active}|#{window_zoomed_flag}|#{window_layout}|#{window_name}",
            ])
            .await?;

        Ok(stdout.lines().filter_map(Self::parse_window_line).collect())
    }

    async fn list_panes(&self, window_id: &str) -> Result<Vec<LivePane>> {
        let stdout = self
            .run(&[
                "list-panes",
                "-t",
                window_id,
                "-F",
                "#{pane_id}|#{pane_index}|#{pane_active}|#{pane_pid}|#{pane_current_path}",
            ])
            .await?;

        Ok(stdout.lines().filter_map(Self::parse_pane_line).collect())
    }

    async fn current(&self) -> Result<Option<ClientContext>> {
        if std::env::var_os("TMUX").is_none() {
            return Ok(None);
        }

        let stdout = self
            .run(&[
                "display-message",
                "-p",
                "#{window_id}|#{pane_id}|#{session_name}",
            ])
            .await?;

        let parts: Vec<&str> = stdout.trim_end().splitn(3, '|').collect();
        if parts.len() < 3 {
            return Ok(None);
        }

        Ok(Some(ClientContext {
            window_id: parts[0].to_string(),
            pane_id: parts[1].to_string(),
            session: parts[2].to_string(),
        }))
    }

    async fn child_command(&self, pid: u32) -> Result<Option<String>> {
        let pid = pid.to_string();
        let output = Command::new("pgrep")
            .args(["-P", pid.as_str()])
            .output()
            .await
            .context("Failed to execute pgrep")?;

        // pgrep exits 1 when the shell has no children
        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(child) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Ok(None);
        };

        let output = Command::new("ps")
            .args(["-o", "args=", "-p", child])
            .output()
            .await
            .context("Failed to execute ps")?;

        if !output.status.success() {
            return Ok(None);
        }

        let args = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!args.is_empty()).then_some(args))
    }

    async fn new_session(&self, name: &str, start_dir: Option<&str>) -> Result<Spawned> {
        let mut args = vec!["new-session", "-d", "-P", "-F", SPAWNED_FORMAT, "-s", name];
        if let Some(dir) = start_dir {
            args.extend(["-c", dir]);
        }
        let stdout = self.run(&args).await?;
        Self::parse_spawned(&stdout)
    }

    /// Kill a session
    async fn kill_session(&self, name: &str) -> Result<()> {
        let target = super::session_target(name);
        self.run(&["kill-session", "-t", target.as_str()]).await?;
        Ok(())
    }

    async fn new_window(
        &self,
        after_window_id: &str,
        name: &str,
        start_dir: Option<&str>,
    ) -> Result<Spawned> {
        // -a places the window at the next index after the target, not in
        // the first free slot of the session
        let mut args = vec!["new-window", "-d", "-a", "-P", "-F", SPAWNED_FORMAT, "-t", after_window_id, "-n", name];
        if let Some(dir) = start_dir {
            args.extend(["-c", dir]);
        }
        let stdout = self.run(&args).await?;
        Self::parse_spawned(&stdout)
    }

    async fn rename_window(&self, window_id: &str, name: &str) -> Result<()> {
        self.run(&["rename-window", "-t", window_id, name]).await?;
        Ok(())
    }

    async fn select_window(&self, window_id: &str) -> Result<()> {
        self.run(&["select-window", "-t", window_id]).await?;
        Ok(())
    }

    async fn kill_window(&self, window_id: &str) -> Result<()> {
        self.run(&["kill-window", "-t", window_id]).await?;
        Ok(())
    }

    async fn select_layout(&self, window_id: &str, layout: &str) -> Result<()> {
        self.run(&["select-layout", "-t", window_id, layout]).await?;
        Ok(())
    }

    async fn split_window(&self, window_id: &str, start_dir: Option<&str>) -> Result<String> {
        let mut args = vec!["split-window", "-d", "-P", "-F", "#{pane_id}", "-t", window_id];
        if let Some(dir) = start_dir {
            args.extend(["-c", dir]);
        }
        let stdout = self.run(&args).await?;
        Ok(stdout.trim().to_string())
    }

    async fn select_pane(&self, pane_id: &str) -> Result<()> {
        self.run(&["select-pane", "-t", pane_id]).await?;
        Ok(())
    }

    async fn kill_pane(&self, pane_id: &str) -> Result<()> {
        self.run(&["kill-pane", "-t", pane_id]).await?;
        Ok(())
    }

    async fn zoom_pane(&self, pane_id: &str) -> Result<()> {
        self.run(&["resize-pane", "-Z", "-t", pane_id]).await?;
        Ok(())
    }

    async fn send_line(&self, pane_id: &str, line: &str) -> Result<()> {
        self.run(&["send-keys", "-t", pane_id, "-l", line]).await?;
        self.run(&["send-keys", "-t", pane_id, "Enter"]).await?;
        Ok(())
    }

    async fn switch_client(&self, target: &str) -> Result<()> {
        self.run(&["switch-client", "-t", target]).await?;
        Ok(())
    }

    async fn display_message(&self, message: &str) -> Result<()> {
        self.run(&["display-message", message]).await?;
        Ok(())
    }
}

impl OptionStore for TmuxClient {
    async fn get_option(&self, name: &str) -> Result<Option<String>> {
        let stdout = self.run(&["show-option", "-gqv", name]).await?;
        let value = stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }
}
