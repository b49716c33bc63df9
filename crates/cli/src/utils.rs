use anyhow::{Result, anyhow};
use astra::{Notification, NotificationKind, ProgressSnapshot, TaskFailure, TaskResult};
use colored::*;
use rustyline::{Config, Editor, error::ReadlineError, history::DefaultHistory};
use spinners::{Spinner, Spinners};

/// Prints a separator line
pub fn print_separator() {
    println!("{}", "─".repeat(48).bright_black());
}

/// Line editor without file history.
pub fn editor() -> Result<Editor<(), DefaultHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .edit_mode(rustyline::EditMode::Emacs)
        .build();
    Editor::with_config(config).map_err(|e| anyhow!("failed to start line editor: {}", e))
}

/// Reads one line; `None` on Ctrl-C / Ctrl-D.
pub fn read_line(rl: &mut Editor<(), DefaultHistory>, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => {
            let _ = rl.add_history_entry(line.as_str());
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(anyhow!(e)),
    }
}

pub fn spinner(message: &str) -> Spinner {
    Spinner::new(Spinners::Dots, message.to_string())
}

/// Stops `spinner` and reports how the task ended.
pub fn finish_spinner<T>(mut spinner: Spinner, result: &TaskResult<T>) {
    match result {
        TaskResult::Success(_) => spinner.stop_and_persist("✔", "Done.".into()),
        TaskResult::SimulatedFallback(_) => spinner.stop_and_persist(
            "⚠",
            "NEURAL NETWORK BUSY (429). ENGAGING OFFLINE SIMULATION...".into(),
        ),
        TaskResult::Failure(_) => spinner.stop_and_persist("✖", "Failed.".into()),
    }
}

pub fn print_failure(failure: &TaskFailure) {
    eprintln!(
        "{} {:?}: {}",
        "CRITICAL FAILURE".bright_red().bold(),
        failure.kind,
        failure.reason
    );
}

pub fn print_notification(notification: &Notification) {
    match notification.kind {
        NotificationKind::LevelUp => println!("{}", notification.message.bright_yellow().bold()),
        NotificationKind::Xp => println!("{}", notification.message.bright_green()),
    }
}

/// Text progress bar, `width` cells wide.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn print_progress(snapshot: &ProgressSnapshot) {
    println!(
        "{} {}   {} {}",
        "LEVEL".bright_cyan().bold(),
        snapshot.level,
        "XP".bright_cyan().bold(),
        snapshot.xp
    );
    println!(
        "{} {:.0}%  (next level at {} XP)",
        progress_bar(snapshot.progress, 20),
        snapshot.progress,
        snapshot.next_level_xp
    );
    if snapshot.skills.is_empty() {
        println!("{}", "No skills recorded yet.".bright_black());
        return;
    }
    print_separator();
    for (topic, xp) in &snapshot.skills {
        println!("  {:<24} {:>6} XP", topic, xp);
    }
}
