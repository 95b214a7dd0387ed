//! The `assessor take` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use assessor_core::answer::Answer;
use assessor_core::clock::ClockDriver;
use assessor_core::events::Notice;
use assessor_core::model::{Mode, QuestionKind};
use assessor_core::session::{
    AssessmentSession, NavOutcome, Rejection, SessionState, SubmitOutcome,
};
use assessor_core::traits::{Notifier, QuestionSource};
use assessor_sources::{create_source, create_telemetry, load_config_from, BankSource};

use super::{parse_mode, print_summary, save_reports};

const START_ATTEMPTS: u32 = 3;

/// Prints notices to stderr as they happen.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        eprintln!("  >> {notice}");
    }
}

/// One line of learner input.
#[derive(Debug, PartialEq)]
enum Input {
    Prev,
    Next,
    /// 1-based question number.
    Goto(usize),
    Hint,
    Flag,
    Confidence(u32),
    Reopen,
    Submit,
    Quit,
    Help,
    Answer(String),
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Answer(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let number = |what: &str| -> Result<u32, String> {
        arg.ok_or_else(|| format!(":{what} needs a number"))?
            .parse::<u32>()
            .map_err(|_| format!(":{what} needs a number"))
    };

    match name {
        "prev" | "p" => Ok(Input::Prev),
        "next" | "n" => Ok(Input::Next),
        "goto" | "g" => {
            let n = number("goto")?;
            if n == 0 {
                return Err("questions are numbered from 1".to_string());
            }
            Ok(Input::Goto(n as usize))
        }
        "hint" | "h" => Ok(Input::Hint),
        "flag" | "f" => Ok(Input::Flag),
        "confidence" | "c" => number("confidence").map(Input::Confidence),
        "reopen" | "r" => Ok(Input::Reopen),
        "submit" => Ok(Input::Submit),
        "quit" | "q" => Ok(Input::Quit),
        "help" | "?" => Ok(Input::Help),
        other => Err(format!("unknown command ':{other}' (try :help)")),
    }
}

const HELP: &str = "\
Type an answer and press enter, or one of:
  :prev / :next       move without answering
  :goto N             jump to question N
  :hint               reveal the next hint
  :flag               flag or unflag this question for review
  :confidence N       record how sure you are
  :reopen             unlock an answer you moved past
  :submit             finish now and see your results
  :quit               abandon the session";

fn show_question(session: &AssessmentSession) {
    let (Some(index), Some(question)) = (session.current_index(), session.current_question())
    else {
        return;
    };
    let remaining = session.time_remaining().unwrap_or(0);
    let flag = if session.is_flagged(&question.id) {
        " [flagged]"
    } else {
        ""
    };

    println!();
    println!(
        "[{}/{}] {} ({} pts, {}) {:02}:{:02} left{}",
        index + 1,
        session.questions().len(),
        question.topic,
        question.points,
        question.difficulty,
        remaining / 60,
        remaining % 60,
        flag
    );
    if let QuestionKind::Scenario { narrative, .. } = &question.kind {
        if !narrative.is_empty() {
            println!("{narrative}");
        }
    }
    println!("{}", question.prompt);

    match &question.kind {
        QuestionKind::TrueFalse { .. } => println!("  (true / false)"),
        QuestionKind::Slider { min, max, .. } => println!("  (a number from {min} to {max})"),
        QuestionKind::FillBlank { .. } => println!("  (separate blanks with |)"),
        QuestionKind::MultipleSelect { .. } => println!("  (choose one or more, comma-separated)"),
        _ => {}
    }
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
    for hint in session.revealed_hints() {
        println!("  hint: {hint}");
    }
    if let Some(record) = session.answer_for(&question.id) {
        let lock = if record.sealed { " (locked)" } else { "" };
        println!("  your answer: {}{lock}", record.answer);
    }
    if let Some(limit) = question.time_limit_seconds {
        if !session.is_timed_out(&question.id) {
            let used = session.question_elapsed().unwrap_or(0);
            println!("  {}s left on this question", u64::from(limit).saturating_sub(used));
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

fn handle_input(session: &mut AssessmentSession, input: Input) -> Flow {
    match input {
        Input::Prev => {
            if session.go_previous() == NavOutcome::OutOfBounds {
                println!("Already at the first question.");
            }
        }
        Input::Next => {
            if session.go_next() == NavOutcome::OutOfBounds {
                println!("Already at the last question. Use :submit to finish.");
            }
        }
        Input::Goto(n) => {
            if session.go_to(n - 1) == NavOutcome::OutOfBounds {
                println!("There is no question {n}.");
            }
        }
        Input::Hint => match session.use_hint() {
            Some(hint) => println!("  hint: {hint}"),
            None => println!("No more hints for this question."),
        },
        Input::Flag => {
            let id = session.current_question().map(|q| q.id.clone());
            if let Some(flagged) = id.and_then(|id| session.toggle_flag(&id)) {
                println!("{}", if flagged { "Flagged." } else { "Unflagged." });
            }
        }
        Input::Confidence(level) => match session.set_confidence(level) {
            Ok(_) => println!("Confidence set to {level}."),
            Err(e) => println!("{e}"),
        },
        Input::Reopen => {
            if session.reopen() {
                println!("Answer unlocked.");
            } else {
                println!("Nothing to reopen here.");
            }
        }
        Input::Submit => {
            session.finish_now();
        }
        Input::Quit => {
            session.abandon();
            return Flow::Quit;
        }
        Input::Help => println!("{HELP}"),
        Input::Answer(text) => {
            let Some(question) = session.current_question().cloned() else {
                return Flow::Continue;
            };
            match Answer::parse(&question, &text) {
                Ok(answer) => {
                    if let SubmitOutcome::Rejected(Rejection::Sealed) = session.submit_answer(answer)
                    {
                        println!("That answer is locked. Use :reopen to change it.");
                    }
                }
                Err(e) => println!("Invalid answer: {e}"),
            }
        }
    }
    Flow::Continue
}

async fn start_with_retry(
    session: &mut AssessmentSession,
    source: &dyn QuestionSource,
    mode: Mode,
    topic: Option<&str>,
) -> Result<()> {
    let mut attempt = 1;
    loop {
        match session.start(source, mode, topic).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < START_ATTEMPTS => {
                eprintln!("  {e}; retrying ({attempt}/{})", START_ATTEMPTS - 1);
                tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e).context("failed to start session"),
        }
    }
}

pub async fn execute(
    bank: Option<PathBuf>,
    mode: String,
    topic: Option<String>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mode = parse_mode(&mode)?;
    let config = load_config_from(config_path.as_deref())?;

    let source: Box<dyn QuestionSource> = match (&bank, &config.source) {
        (Some(path), _) => Box::new(BankSource::open(path)),
        (None, Some(source_config)) => create_source(source_config)?,
        (None, None) => {
            anyhow::bail!("no question source configured; pass --bank or run `assessor init`")
        }
    };
    let telemetry = create_telemetry(&config.telemetry)?;

    let mut session = AssessmentSession::new(config.session_config())
        .with_telemetry(telemetry)
        .with_notifier(Arc::new(ConsoleNotifier));
    start_with_retry(&mut session, source.as_ref(), mode, topic.as_deref()).await?;
    eprintln!("Type :help for commands.");

    let shared = session.into_shared();
    let mut driver = ClockDriver::spawn(shared.clone(), Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_read = false;

    loop {
        {
            let guard = shared.lock().await;
            if guard.state() != SessionState::Running {
                break;
            }
            show_question(&guard);
        }

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input")?,
            _ = driver.stopped() => {
                pending_read = true;
                break;
            }
        };

        let mut guard = shared.lock().await;
        let Some(line) = line else {
            // stdin closed; grade what we have
            guard.finish_now();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_input(&line) {
            Ok(input) => {
                tracing::debug!(?input, "learner input");
                if let Flow::Quit = handle_input(&mut guard, input) {
                    println!("Session abandoned.");
                    return Ok(());
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    driver.stop();
    let report = shared
        .lock()
        .await
        .take_report()
        .context("session ended without a report")?;

    print_summary(&report);
    let output = output.unwrap_or(config.output_dir);
    save_reports(&report, &output, &format)?;
    if pending_read {
        // the blocking stdin read cannot be cancelled
        println!("Press enter to exit.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_answer() {
        assert_eq!(parse_input("  Paris "), Ok(Input::Answer("Paris".into())));
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_input(":prev"), Ok(Input::Prev));
        assert_eq!(parse_input(":goto 3"), Ok(Input::Goto(3)));
        assert_eq!(parse_input(":c 4"), Ok(Input::Confidence(4)));
        assert_eq!(parse_input(":submit"), Ok(Input::Submit));
    }

    #[test]
    fn bad_commands_are_rejected() {
        assert!(parse_input(":goto").is_err());
        assert!(parse_input(":goto 0").is_err());
        assert!(parse_input(":confidence high").is_err());
        assert!(parse_input(":dance").is_err());
    }
}
