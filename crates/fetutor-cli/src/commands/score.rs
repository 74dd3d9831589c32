//! The `fetutor score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fetutor_core::scorer::{Availability, MasteryScorer};

use super::OracleArgs;

pub async fn execute(transcript_path: PathBuf, oracle_args: OracleArgs) -> Result<()> {
    let config = oracle_args.load_config()?;
    let transcript = std::fs::read_to_string(&transcript_path)
        .with_context(|| format!("failed to read transcript: {}", transcript_path.display()))?;

    let scorer = MasteryScorer::new(
        oracle_args.oracle(&config)?,
        config.rubric(),
        config.oracle_settings(oracle_args.model.as_deref()),
    );
    let score = scorer.score(&transcript).await;

    println!("Mastery score: {}", score.display());
    if let Availability::Unavailable {
        reason,
        quota_exhausted,
    } = score.availability()
    {
        if *quota_exhausted {
            println!("The oracle's quota is exhausted; try again later.");
        }
        println!("Reason: {reason}");
    }
    Ok(())
}
