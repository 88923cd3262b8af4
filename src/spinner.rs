use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{stderr, IsTerminal};
use std::time::Duration;
use tokio::task::JoinHandle;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Cosmetic progress indicator on stderr, drawn only when stderr is a terminal
pub struct Spinner {
    task: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(label: &str) -> Self {
        if !stderr().is_terminal() {
            return Self { task: None };
        }

        let label = label.to_string();
        let task = tokio::spawn(async move {
            for frame in FRAMES.iter().cycle() {
                let _ = execute!(
                    stderr(),
                    MoveToColumn(0),
                    Clear(ClearType::CurrentLine),
                    Print(format!("{} {}", frame, label))
                );
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
        });

        Self { task: Some(task) }
    }

    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = execute!(stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}
