//! Runtime configuration resolved once from tmux global options.

use anyhow::Result;
use std::path::PathBuf;
use tracing::warn;

pub const FILE_OPTION: &str = "@keep-file";
pub const KILL_LAUNCH_OPTION: &str = "@keep-kill-launch-session";
pub const PICKER_OPTION: &str = "@keep-picker";

const DEFAULT_PICKER: &str = "fzf";

/// Named key-value options with "unset" as a distinct answer
#[allow(async_fn_in_trait)]
pub trait OptionStore {
    async fn get_option(&self, name: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Location of the session document
    pub session_file: PathBuf,
    /// Kill a throwaway launch session once focus has moved elsewhere
    pub kill_launch_session: bool,
    /// Interactive picker program used by `choose`
    pub picker: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
            kill_launch_session: true,
            picker: DEFAULT_PICKER.to_string(),
        }
    }
}

impl Config {
    pub async fn load<S: OptionStore>(store: &S) -> Self {
        let defaults = Self::default();

        let session_file = read(store, FILE_OPTION)
            .await
            .map(|raw| expand_home(&raw))
            .unwrap_or(defaults.session_file);

        let kill_launch_session = match read(store, KILL_LAUNCH_OPTION).await {
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                warn!(option = KILL_LAUNCH_OPTION, value = %raw, "not a boolean, using default");
                defaults.kill_launch_session
            }),
            None => defaults.kill_launch_session,
        };

        let picker = read(store, PICKER_OPTION).await.unwrap_or(defaults.picker);

        Self {
            session_file,
            kill_launch_session,
            picker,
        }
    }
}

async fn read<S: OptionStore>(store: &S, name: &str) -> Option<String> {
    match store.get_option(name).await {
        Ok(value) => value,
        Err(e) => {
            warn!(option = name, error = %e, "could not read option, using default");
            None
        }
    }
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_default()
        .join(env!("CARGO_PKG_NAME"))
        .join("sessions.json")
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        None => PathBuf::from(raw),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
