//! The `fetutor report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fetutor_core::report::{self, with_feedback, Delivery, ReportComposer, SessionReport};
use fetutor_core::scorer::MasteryScorer;

use super::OracleArgs;

pub async fn execute(
    transcript_path: PathBuf,
    user: String,
    topic: String,
    feedback: Option<String>,
    send: bool,
    output: Option<PathBuf>,
    oracle_args: OracleArgs,
) -> Result<()> {
    let config = oracle_args.load_config()?;
    let mut transcript = std::fs::read_to_string(&transcript_path)
        .with_context(|| format!("failed to read transcript: {}", transcript_path.display()))?;
    if let Some(fb) = feedback.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        transcript = with_feedback(transcript.trim_end(), fb);
    }

    let oracle = oracle_args.oracle(&config)?;
    let settings = config.oracle_settings(oracle_args.model.as_deref());

    let score = MasteryScorer::new(oracle.clone(), config.rubric(), settings.clone())
        .score(&transcript)
        .await;
    let mut session_report = ReportComposer::new(oracle, settings)
        .compose(&user, &topic, &transcript, &score)
        .await;

    if send {
        match config.notifier()? {
            Some(notifier) => {
                session_report.delivery =
                    report::deliver(&session_report, notifier.as_ref(), &config.delivery()).await;
            }
            None => println!("No notifier configured; report not sent."),
        }
    }

    print_report(&session_report);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&session_report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

pub(crate) fn print_report(report: &SessionReport) {
    println!("=== Session report: {} / {} ===", report.user_name, report.topic);
    println!("Score: {}", report.score.display());
    if report.is_placeholder() {
        println!("(analysis unavailable; showing placeholder)");
    }
    println!();
    println!("{}", report.text);
    println!();
    match &report.delivery {
        Delivery::NotAttempted => {}
        Delivery::Sent { to } => println!("Report sent to {to}."),
        Delivery::Failed { reason } => println!("Report could not be sent: {reason}"),
    }
}
