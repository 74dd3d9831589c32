//! The `fetutor session` command: an interactive tutoring loop on stdin.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use fetutor_core::error::OracleError;
use fetutor_core::flow::Flow;
use fetutor_core::model::{Problem, ProblemBank};
use fetutor_core::report::{Delivery, ReportComposer};
use fetutor_core::scorer::MasteryScorer;
use fetutor_core::session::{SkipPolicy, Session};
use fetutor_core::tutor::Tutor;

use super::report::print_report;
use super::OracleArgs;

const HELP: &str = "Commands: /pick <option>  /skip  /retry  /status  /done  /quit  /help";

pub async fn execute(
    problem_id: Option<String>,
    bank: Option<PathBuf>,
    user: String,
    oracle_args: OracleArgs,
) -> Result<()> {
    let config = oracle_args.load_config()?;
    let bank = super::load_bank(bank.as_deref(), &config)?;
    let oracle = oracle_args.oracle(&config)?;
    let settings = config.oracle_settings(oracle_args.model.as_deref());
    let notifier = config.notifier()?;
    let delivery = config.delivery();
    let skip_policy = SkipPolicy {
        notify: config.notify_on_skip,
    };

    let stdin = std::io::stdin();
    let mut input = stdin.lock().lines();

    // Landing
    let mut flow = Flow::new(config.tolerance);
    let problem = match problem_id {
        Some(id) => bank
            .get(&id)
            .with_context(|| format!("no problem with id '{id}'"))?,
        None => match choose_problem(&bank, &mut input)? {
            Some(p) => p,
            None => return Ok(()),
        },
    };
    flow.start(problem.clone());
    info!(problem = problem.id(), user = %user, oracle = oracle.name(), "session started");
    show_problem(&problem);

    // Chat
    let tutor = Tutor::new(oracle.clone(), settings.clone());
    let greeting = Tutor::greeting(&problem);
    println!("Tutor: {greeting}");
    println!("{HELP}");
    active_session(&mut flow)?.record_tutor(greeting);

    loop {
        prompt("> ")?;
        let Some(line) = input.next() else { break };
        let line = line?;
        let text = line.trim();
        let (command, arg) = text.split_once(' ').unwrap_or((text, ""));

        match command {
            "" => continue,
            "/help" => println!("{HELP}"),
            "/quit" => {
                println!("Session discarded.");
                return Ok(());
            }
            "/done" => break,
            "/status" => show_status(active_session(&mut flow)?),
            "/pick" => {
                if problem.options().is_empty() {
                    println!("This problem has no multiple-choice options.");
                } else if problem.check_option(arg) {
                    println!("Correct!");
                    if !problem.explanation().is_empty() {
                        println!("Explanation: {}", problem.explanation());
                    }
                } else {
                    println!("Not quite. Check your calculations or ask the tutor for a hint.");
                }
            }
            "/skip" => {
                let record = active_session(&mut flow)?.skip();
                println!(
                    "Skipped {}. Solved so far: {}.",
                    record.problem_id,
                    list_or_none(&record.solved)
                );
                let status = skip_policy
                    .apply(&record, &user, notifier.as_deref(), &delivery)
                    .await;
                if let Delivery::Failed { reason } = status {
                    println!("(skip notification failed: {reason})");
                }
            }
            "/retry" => {
                let session = active_session(&mut flow)?;
                if !session.transcript().awaiting_reply() {
                    println!("Nothing to retry: the tutor has already replied.");
                    continue;
                }
                match tutor.retry_reply(session).await {
                    Ok(reply) => println!("Tutor: {reply}"),
                    Err(e) => println!("{}", oracle_failure_message(&e)),
                }
            }
            _ => {
                let outcome = tutor.respond(active_session(&mut flow)?, text).await;
                for name in &outcome.grade.newly_solved {
                    println!("✓ {name} is correct.");
                }
                if outcome.grade.all_solved && !outcome.grade.newly_solved.is_empty() {
                    println!("All targets solved! Type /done for your report.");
                }
                match outcome.reply {
                    Ok(reply) => println!("Tutor: {reply}"),
                    Err(e) => println!("{}", oracle_failure_message(&e)),
                }
            }
        }
    }

    // Report
    flow.finish()?;
    if let Some(finished) = flow.session() {
        info!(
            problem = problem.id(),
            solved = finished.solved().len(),
            turns = finished.transcript().len(),
            "session finished"
        );
    }
    prompt("Any feedback for your instructor? (Enter to skip) ")?;
    let feedback = match input.next() {
        Some(line) => line?,
        None => String::new(),
    };

    let finished = flow
        .session()
        .context("no session to report on")?;
    let report_input = finished.report_input(Some(&feedback));

    let score = MasteryScorer::new(oracle.clone(), config.rubric(), settings.clone())
        .score(&report_input)
        .await;
    let composer = ReportComposer::new(oracle, settings);
    let topic = format!("{} ({})", problem.category(), problem.id());
    let report = match &notifier {
        Some(n) => {
            composer
                .compose_and_deliver(&user, &topic, &report_input, &score, n.as_ref(), &delivery)
                .await
        }
        None => composer.compose(&user, &topic, &report_input, &score).await,
    };

    println!();
    print_report(&report);
    flow.restart()?;
    Ok(())
}

fn active_session(flow: &mut Flow) -> Result<&mut Session> {
    flow.session_mut().context("no active session")
}

/// What a failed tutor reply means for the student. Grading has already
/// happened by the time this is shown.
fn oracle_failure_message(e: &OracleError) -> String {
    if e.is_quota() {
        let wait = match e.retry_after_ms() {
            Some(ms) => format!(" (retry in about {}s)", ms.div_ceil(1000)),
            None => String::new(),
        };
        format!("Tutor is over quota right now{wait}. Your answer was still graded; type /retry later.")
    } else if e.is_permanent() {
        format!(
            "Tutor unavailable: {e}. Retrying will not help; your answers are still graded, \
             type /done for your report."
        )
    } else {
        format!("Tutor unavailable: {e}. Type /retry to try again.")
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

fn choose_problem<I>(bank: &ProblemBank, input: &mut I) -> Result<Option<Arc<Problem>>>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    if bank.is_empty() {
        anyhow::bail!("the problem bank is empty");
    }
    println!("Available problems:");
    for p in bank.problems() {
        println!("  {:<8} {}", p.id(), p.category());
    }
    loop {
        prompt("Problem ID: ")?;
        let Some(line) = input.next() else {
            return Ok(None);
        };
        let line = line?;
        let id = line.trim();
        match bank.get(id) {
            Some(p) => return Ok(Some(p)),
            None => println!("No problem with id '{id}'."),
        }
    }
}

fn show_problem(problem: &Problem) {
    println!();
    println!("[{}] {}", problem.category(), problem.id());
    println!("{}", problem.statement());
    for (i, option) in problem.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
    println!();
}

fn show_status(session: &Session) {
    println!("Solved: {}", list_or_none(&session.solved()));
    println!("Remaining: {}", list_or_none(&session.remaining()));
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
