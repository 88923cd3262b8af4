use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;

mod actions;
mod app;
mod chooser;
mod config;
mod document;
mod restore;
mod snapshot;
mod spinner;
mod tmux;

use actions::Action;
use app::App;
use chooser::FzfPicker;
use config::Config;
use spinner::Spinner;
use tmux::TmuxClient;

/// Save and restore tmux sessions
#[derive(Debug, Parser)]
#[command(name = "tmux-keep", version, about)]
struct Cli {
    #[command(subcommand)]
    verb: Verb,
}

#[derive(Debug, Subcommand)]
enum Verb {
    /// Pick a saved or running session and switch to it
    Choose,
    /// Save the current session
    Update,
    /// Rebuild the current session from its saved state
    Revert,
    /// Forget the current session and kill it
    Delete,
    /// Save every running session
    #[command(name = "save_all")]
    SaveAll,
    /// Restore every saved session
    #[command(name = "restore_all")]
    RestoreAll {
        /// Rebuild sessions that are already running
        #[arg(short, long)]
        force: bool,
    },
    // `tmux-keep <session> [force]`
    #[command(external_subcommand)]
    Restore(Vec<String>),
}

impl Verb {
    fn into_action(self) -> Result<Action, String> {
        Ok(match self {
            Verb::Choose => Action::Choose,
            Verb::Update => Action::Update,
            Verb::Revert => Action::Revert,
            Verb::Delete => Action::Delete,
            Verb::SaveAll => Action::SaveAll,
            Verb::RestoreAll { force } => Action::RestoreAll { force },
            Verb::Restore(args) => {
                let mut args = args.into_iter();
                let name = args.next().ok_or("missing session name")?;
                let force = match args.next().as_deref() {
                    None => false,
                    Some("force" | "-f" | "--force") => true,
                    Some(other) => return Err(format!("unexpected argument '{}'", other)),
                };
                if let Some(extra) = args.next() {
                    return Err(format!("unexpected argument '{}'", extra));
                }
                Action::RestoreOne { name, force }
            }
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TMUX_KEEP_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::from(1),
            };
        }
    };

    let action = match cli.verb.into_action() {
        Ok(action) => action,
        Err(message) => {
            eprintln!("error: {}\n\n{}", message, Cli::command().render_usage());
            return ExitCode::from(1);
        }
    };

    run(action).await;
    ExitCode::SUCCESS
}

/// Dispatch one action and report the outcome on the tmux status line
async fn run(action: Action) {
    let client = TmuxClient::new();
    let config = Config::load(&client).await;
    let picker = FzfPicker::new(config.picker.clone());
    let app = App::new(client, picker, config);

    let spinner = action.shows_progress().then(|| Spinner::start("working"));
    let result = app.handle_action(action).await;
    if let Some(spinner) = spinner {
        spinner.stop();
    }

    let message = match result {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "action failed");
            format!("ERROR: {:#}", e)
        }
    };

    app.notify(&message).await;
    println!("{}", message);
}
