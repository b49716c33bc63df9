//! Terminal front-ends for the progression engine and the AI tasks.

use anyhow::{Context, Result, anyhow, bail};
use astra::{
    AstraConfig, MediaMime, ProgressionEngine, TaskController, TaskResult,
    arcade::{QuizSession, SECONDS_PER_QUESTION},
    chat::CareerChat,
    store::FileStore,
    tasks::{career, scan, trivia::{self, TriviaQuestion}},
};
use colored::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::utils::{
    editor, finish_spinner, print_failure, print_notification, print_progress, print_separator,
    read_line, spinner,
};

fn open_engine(config: &AstraConfig) -> Result<Arc<ProgressionEngine>> {
    let dir = config.data_dir();
    let store = FileStore::in_dir(&dir)
        .with_context(|| format!("failed to open state in {}", dir.display()))?;
    Ok(Arc::new(ProgressionEngine::load(Arc::new(store))?))
}

/// Returns the payload, or prints the failure and bails.
fn unwrap_result<T>(result: TaskResult<T>) -> Result<(T, bool)> {
    let simulated = result.is_simulated();
    match result {
        TaskResult::Failure(failure) => {
            print_failure(&failure);
            bail!("{:?} failure", failure.kind)
        }
        other => other
            .into_data()
            .map(|data| (data, simulated))
            .ok_or_else(|| anyhow!("task produced no data")),
    }
}

/// Maps typed input to an option index; unparsable input is a wrong answer.
pub fn parse_choice(input: &str, options: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Seconds left on the question clock after `elapsed_secs`.
pub fn time_left(elapsed_secs: u64) -> Option<u64> {
    SECONDS_PER_QUESTION.checked_sub(elapsed_secs).filter(|left| *left > 0)
}

/// `astra progress`
pub fn progress(config: &AstraConfig, reset: bool) -> Result<()> {
    let engine = open_engine(config)?;
    if reset {
        engine.reset()?;
        println!("{}", "Progression reset.".bright_yellow());
    }
    print_progress(&engine.state());
    Ok(())
}

fn correct_option(question: &TriviaQuestion, index: usize) -> &str {
    question.options.get(index).map(String::as_str).unwrap_or("?")
}

/// `astra trivia <topic>`
pub async fn trivia(config: &AstraConfig, controller: &TaskController, topic: &str) -> Result<()> {
    let engine = open_engine(config)?;
    let sp = spinner(&format!("Generating {} questions...", topic));
    let result = controller
        .execute(trivia::trivia_request(topic), trivia::simulated_questions())
        .await;
    finish_spinner(sp, &result);
    let (questions, _) = unwrap_result(result)?;

    let mut session = QuizSession::new(topic, questions, engine.clone())?;
    let mut rl = editor()?;
    while let Some(question) = session.current().cloned() {
        print_separator();
        println!(
            "{} {}/{}   {} {}   {} x{}",
            "Q".bright_cyan().bold(),
            session.position() + 1,
            session.len(),
            "SCORE".bright_cyan().bold(),
            session.score(),
            "STREAK".bright_cyan().bold(),
            session.streak()
        );
        println!("{}", question.question.bold());
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }

        let started = Instant::now();
        let Some(line) = read_line(&mut rl, &format!("answer ({}s) > ", SECONDS_PER_QUESTION))?
        else {
            println!("{}", "Round abandoned.".bright_yellow());
            break;
        };
        let outcome = match time_left(started.elapsed().as_secs()) {
            Some(left) => {
                session.answer(parse_choice(&line, question.options.len()), left)?
            }
            None => {
                println!("{}", "TIME OUT".bright_red());
                session.answer(None, 0)?
            }
        };

        if outcome.correct {
            println!("{} +{}", "CORRECT".bright_green().bold(), outcome.points);
        } else {
            println!(
                "{} answer was: {}",
                "WRONG".bright_red().bold(),
                correct_option(&question, outcome.correct_index)
            );
        }
        if let Some(notification) = &outcome.notification {
            print_notification(notification);
        }
    }

    print_separator();
    println!(
        "{} {}   {} x{}",
        "FINAL SCORE".bright_cyan().bold(),
        session.score(),
        "STREAK".bright_cyan().bold(),
        session.streak()
    );
    print_progress(&engine.state());
    Ok(())
}

/// `astra scan <file>`
pub async fn scan(controller: &TaskController, file: &Path) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mime = MediaMime::detect(&data)
        .ok_or_else(|| anyhow!("{}: unsupported file type", file.display()))?;

    let sp = spinner(&format!("Scanning {}...", file.display()));
    let result = controller
        .execute(scan::scan_request(mime, data), scan::simulated_report())
        .await;
    finish_spinner(sp, &result);
    let (report, _) = unwrap_result(result)?;

    print_separator();
    println!("{} {}", "TYPE".bright_cyan().bold(), report.kind);
    println!("{} {}", "CONFIDENCE".bright_cyan().bold(), report.confidence);
    println!("{} {}", "AUTHOR".bright_cyan().bold(), report.author);
    println!("{} {}", "DATE".bright_cyan().bold(), report.date);
    println!("{} {}", "KEYWORDS".bright_cyan().bold(), report.keywords.join(", "));
    print_separator();
    println!("{}", report.summary);
    Ok(())
}

/// `astra career --subjects .. --interests ..`
pub async fn career(
    config: &AstraConfig,
    controller: &TaskController,
    profile: career::CareerProfile,
) -> Result<()> {
    let engine = open_engine(config)?;
    let sp = spinner("Synthesizing Career Trajectories...");
    let result = career::analyze(controller, &engine, &profile).await?;
    finish_spinner(sp, &result);
    let (report, simulated) = unwrap_result(result)?;

    print_separator();
    println!("{} {}", "MATCH".bright_cyan().bold(), report.title.bold());
    println!("{}", report.desc);
    println!(
        "{} {}%   {} {}   {} {}",
        "CONFIDENCE".bright_cyan().bold(),
        report.xp,
        "GROWTH".bright_cyan().bold(),
        report.growth,
        "SALARY".bright_cyan().bold(),
        report.salary
    );
    for point in &report.chart_data {
        println!("  {:<12} {:>3}", point.subject, point.score);
    }
    for notification in engine.active_notifications() {
        print_notification(&notification);
    }

    let Some(provider) = controller.provider().cloned() else {
        return Ok(());
    };
    print_separator();
    println!("{}", report.greeting(simulated).bright_green());
    let mut chat = CareerChat::new(provider, report.title.clone());
    let mut rl = editor()?;
    while let Some(line) = read_line(&mut rl, "you > ")? {
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        let mut sp = spinner("Computing Response...");
        let reply = chat.send(&line).await;
        sp.stop();
        print!("\r\x1B[K");
        if let Some(reply) = reply {
            println!("{} {}", "nexus >".bright_green(), reply);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 4), Some(0));
        assert_eq!(parse_choice(" 4 ", 4), Some(3));
        assert_eq!(parse_choice("5", 4), None);
        assert_eq!(parse_choice("0", 4), None);
        assert_eq!(parse_choice("b", 4), None);
    }

    #[test]
    fn test_correct_option() {
        let question = trivia::simulated_questions().remove(1);
        assert_eq!(correct_option(&question, 1), "Silicon");
        assert_eq!(correct_option(&question, 9), "?");
    }

    #[test]
    fn test_time_left() {
        assert_eq!(time_left(0), Some(15));
        assert_eq!(time_left(14), Some(1));
        assert_eq!(time_left(15), None);
        assert_eq!(time_left(40), None);
    }
}
