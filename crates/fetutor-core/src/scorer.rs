//! Rubric-driven mastery scoring.
//!
//! The oracle judges the transcript against a fixed rubric; the scorer only
//! trusts the first run of digits in its answer, clamped to 0..=10. When the
//! oracle cannot be reached the score is 0 *and* flagged unavailable, so a
//! caller never mistakes an outage for a genuine zero.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::OracleError;
use crate::traits::{Oracle, OracleSettings};

/// Highest score on the rubric scale.
pub const MAX_SCORE: u8 = 10;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Scoring policy handed to the oracle as instruction text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    /// Subject being assessed (e.g. "Statics").
    pub subject: String,
    /// Who the oracle should act as.
    pub persona: String,
}

impl Default for Rubric {
    fn default() -> Self {
        Self::for_subject("Statics")
    }
}

impl Rubric {
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            persona: "You are a strict engineering professor.".to_string(),
        }
    }

    /// Render the instruction text.
    pub fn instruction(&self) -> String {
        format!(
            "{persona} Evaluate the student's mastery of {subject} (0-10) based ONLY on the chat history.\n\n\
             STRICT SCORING RUBRIC:\n\
             0-3: No technical content, or a complete misunderstanding of the fundamentals.\n\
             4-6: Conceptual understanding, but the governing equations or formal notation are missing.\n\
             7-8: Correct formal notation (e.g. $\\sum F_x = 0$, $\\sum M_A = 0$) and sound reasoning.\n\
             9-10: Flawless formal reasoning with consistent notation throughout.\n\n\
             CRITICAL RULES:\n\
             1. If the student never explicitly states the governing equations, do NOT exceed 6.\n\
             2. Penalize sloppy notation (like 'Sum Fx' or 'MA') in place of formal notation ($\\sum F_x$, $M_A$).\n\
             3. Output ONLY the integer.",
            persona = self.persona,
            subject = self.subject,
        )
    }
}

/// Whether a score came from the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Graded,
    Unavailable {
        reason: String,
        quota_exhausted: bool,
    },
}

/// A 0..=10 score plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryScore {
    value: u8,
    availability: Availability,
}

impl MasteryScore {
    /// A score parsed from oracle output; clamped into range.
    pub fn graded(value: u8) -> Self {
        Self {
            value: value.min(MAX_SCORE),
            availability: Availability::Graded,
        }
    }

    /// The fail-closed score for an oracle failure.
    pub fn unavailable(error: &OracleError) -> Self {
        Self {
            value: 0,
            availability: Availability::Unavailable {
                reason: error.to_string(),
                quota_exhausted: error.is_quota(),
            },
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Graded)
    }

    pub fn is_quota_exhausted(&self) -> bool {
        matches!(
            self.availability,
            Availability::Unavailable {
                quota_exhausted: true,
                ..
            }
        )
    }

    /// `"7/10"`, or `"unavailable"` when the oracle was unreachable.
    pub fn display(&self) -> String {
        if self.is_available() {
            format!("{}/{}", self.value, MAX_SCORE)
        } else {
            "unavailable".to_string()
        }
    }
}

/// Pull a score out of free text: first digit run, default 0, clamped to 0..=10.
pub fn extract_score(text: &str) -> u8 {
    match DIGITS.find(text) {
        // A run too long for u64 is still a (huge) positive number.
        Some(m) => m.as_str().parse::<u64>().map_or(MAX_SCORE, |v| {
            v.min(u64::from(MAX_SCORE)) as u8
        }),
        None => 0,
    }
}

/// Scores a transcript through the injected oracle.
pub struct MasteryScorer {
    oracle: Arc<dyn Oracle>,
    rubric: Rubric,
    settings: OracleSettings,
}

impl MasteryScorer {
    pub fn new(oracle: Arc<dyn Oracle>, rubric: Rubric, settings: OracleSettings) -> Self {
        Self {
            oracle,
            rubric,
            settings,
        }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Score a rendered transcript. Never fails; see [`MasteryScore::is_available`].
    #[instrument(skip(self, transcript), fields(oracle = self.oracle.name(), transcript_len = transcript.len()))]
    pub async fn score(&self, transcript: &str) -> MasteryScore {
        let request = self.settings.request(
            self.rubric.instruction(),
            format!("Chat history to evaluate:\n{transcript}"),
        );
        match self.oracle.complete(&request).await {
            Ok(response) => MasteryScore::graded(extract_score(&response.text)),
            Err(e) => {
                warn!(error = %e, quota = e.is_quota(), "mastery scoring unavailable");
                MasteryScore::unavailable(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;

    #[test]
    fn extract_score_is_always_in_range() {
        assert_eq!(extract_score("7"), 7);
        assert_eq!(extract_score("Score: 8/10"), 8);
        assert_eq!(extract_score("I would give this a 42"), 10);
        assert_eq!(extract_score("-3"), 3);
        assert_eq!(extract_score(""), 0);
        assert_eq!(extract_score("excellent work"), 0);
        assert_eq!(extract_score("99999999999999999999999999"), 10);
        assert_eq!(extract_score("0"), 0);
    }

    #[test]
    fn rubric_states_every_band() {
        let text = Rubric::for_subject("Dynamics").instruction();
        assert!(text.contains("mastery of Dynamics"));
        for band in ["0-3:", "4-6:", "7-8:", "9-10:"] {
            assert!(text.contains(band), "missing band {band}");
        }
        assert!(text.contains("Output ONLY the integer"));
    }

    #[test]
    fn score_display_distinguishes_unavailable() {
        assert_eq!(MasteryScore::graded(0).display(), "0/10");
        assert_eq!(MasteryScore::graded(12).value(), 10);
        let s = MasteryScore::unavailable(&OracleError::Timeout(20));
        assert_eq!(s.value(), 0);
        assert_eq!(s.display(), "unavailable");
        assert!(!s.is_quota_exhausted());
    }

    #[tokio::test]
    async fn score_uses_rubric_and_transcript() {
        let oracle = Arc::new(ScriptedOracle::replies(["Score: 9"]));
        let scorer = MasteryScorer::new(oracle.clone(), Rubric::default(), OracleSettings::default());

        let score = scorer.score("Student: $\\sum F_x = 0$").await;
        assert_eq!(score, MasteryScore::graded(9));

        let request = oracle.last_request().unwrap();
        assert!(request.system.contains("STRICT SCORING RUBRIC"));
        assert!(request.prompt.starts_with("Chat history to evaluate:\n"));
        assert!(request.prompt.contains("\\sum F_x"));
    }

    #[tokio::test]
    async fn score_non_numeric_reply_defaults_to_zero_but_graded() {
        let oracle = Arc::new(ScriptedOracle::replies(["No idea."]));
        let scorer = MasteryScorer::new(oracle, Rubric::default(), OracleSettings::default());
        let score = scorer.score("Student: hi").await;
        assert_eq!(score.value(), 0);
        assert!(score.is_available());
    }

    #[tokio::test]
    async fn quota_exhaustion_is_observable() {
        let oracle = Arc::new(ScriptedOracle::failing(OracleError::QuotaExceeded {
            retry_after_ms: Some(1000),
        }));
        let scorer = MasteryScorer::new(oracle, Rubric::default(), OracleSettings::default());
        let score = scorer.score("Student: hi").await;
        assert_eq!(score.value(), 0);
        assert!(!score.is_available());
        assert!(score.is_quota_exhausted());
    }
}
