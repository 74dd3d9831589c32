//! Session report composition and delivery.
//!
//! The oracle writes the narrative; the composer guarantees that the
//! student's own feedback survives verbatim and that an unavailable score is
//! never presented as a real zero. Delivery is best effort: the report is
//! returned to the caller whatever the notifier does.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::scorer::MasteryScore;
use crate::traits::{Notification, Notifier, Oracle, OracleSettings};

/// Marker line that opens the student feedback block in a transcript.
pub const FEEDBACK_MARKER: &str = "--- STUDENT FEEDBACK ---";

/// Where the report text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSource {
    Generated,
    Placeholder { reason: String },
}

/// Outcome of handing the report to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    NotAttempted,
    Sent { to: String },
    Failed { reason: String },
}

/// A composed report. Held for display and outbound delivery only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub user_name: String,
    pub topic: String,
    pub text: String,
    pub score: MasteryScore,
    pub source: ReportSource,
    /// True when the feedback block had to be appended because the oracle dropped it.
    pub feedback_injected: bool,
    pub delivery: Delivery,
    pub created_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ReportSource::Placeholder { .. })
    }
}

/// Fixed delivery settings.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    /// Application name used in the subject line.
    pub app_name: String,
    /// Fixed recipient.
    pub recipient: String,
}

/// Append `feedback` to a transcript under the marker line.
pub fn with_feedback(transcript: &str, feedback: &str) -> String {
    format!("{transcript}\n\n{FEEDBACK_MARKER}\n{}", feedback.trim())
}

/// The feedback block: everything after the marker line, trimmed.
/// `None` when there is no marker or the block is empty.
pub fn extract_feedback(transcript: &str) -> Option<&str> {
    let start = transcript.find(FEEDBACK_MARKER)? + FEEDBACK_MARKER.len();
    let block = transcript[start..].trim();
    (!block.is_empty()).then_some(block)
}

/// Make sure `feedback` appears verbatim in `text`; returns whether it was appended.
fn ensure_feedback(text: &mut String, feedback: Option<&str>) -> bool {
    match feedback {
        Some(fb) if !text.contains(fb) => {
            text.push_str(&format!("\n\n{FEEDBACK_MARKER}\n{fb}"));
            true
        }
        _ => false,
    }
}

/// Build the notification subject line.
pub fn subject_line(app_name: &str, user_name: &str, topic: &str, score: &MasteryScore) -> String {
    format!(
        "{app_name} ({user_name}): {topic} [Score: {}]",
        score.display()
    )
}

const AUDIENCE: &str = "the course instructor";

/// Produces session reports through the injected oracle.
pub struct ReportComposer {
    oracle: Arc<dyn Oracle>,
    settings: OracleSettings,
}

impl ReportComposer {
    pub fn new(oracle: Arc<dyn Oracle>, settings: OracleSettings) -> Self {
        Self { oracle, settings }
    }

    fn instruction(&self, score: &MasteryScore) -> String {
        let score_line = if score.is_available() {
            format!("2. Numerical Understanding Score: {}", score.display())
        } else {
            "2. Numerical Understanding Score: unavailable (the scoring service could not be \
             reached; do NOT report a number)"
                .to_string()
        };
        format!(
            "You are an academic evaluator analyzing a tutoring session for {AUDIENCE}.\n\
             Your report must include:\n\
             1. Session Overview\n\
             {score_line}\n\
             3. Mathematical Rigor: did the student state the governing equations in formal notation \
             (e.g. $\\sum F = 0$, $\\sum M = 0$)?\n\
             4. Free-Body Logic: did the student correctly identify force components?\n\
             5. Engagement Level\n\
             6. CRITICAL: Quote the section '{FEEDBACK_MARKER}' exactly."
        )
    }

    /// Compose the report text. Never fails; oracle errors yield a placeholder.
    #[instrument(skip(self, transcript, score), fields(oracle = self.oracle.name()))]
    pub async fn compose(
        &self,
        user_name: &str,
        topic: &str,
        transcript: &str,
        score: &MasteryScore,
    ) -> SessionReport {
        let prompt = format!(
            "Student Name: {user_name}\n\
             Topic: {topic}\n\
             Assigned Score: {}\n\n\
             DATA:\n{transcript}\n\n\
             Format the report for {AUDIENCE}. Ensure all math/vectors in the report use LaTeX.",
            score.display(),
        );
        let request = self.settings.request(self.instruction(score), prompt);
        let feedback = extract_feedback(transcript);

        let (mut text, source) = match self.oracle.complete(&request).await {
            Ok(response) => (response.text, ReportSource::Generated),
            Err(e) => {
                warn!(error = %e, quota = e.is_quota(), "report generation failed; using placeholder");
                let reason = e.to_string();
                let text = format!(
                    "AI analysis unavailable ({reason}).\n\n\
                     Student: {user_name}\nTopic: {topic}\nScore: {}",
                    score.display()
                );
                (text, ReportSource::Placeholder { reason })
            }
        };

        let feedback_injected = ensure_feedback(&mut text, feedback);
        if feedback_injected {
            info!("student feedback missing from generated text; appended verbatim");
        }

        SessionReport {
            user_name: user_name.to_string(),
            topic: topic.to_string(),
            text,
            score: score.clone(),
            source,
            feedback_injected,
            delivery: Delivery::NotAttempted,
            created_at: Utc::now(),
        }
    }

    /// Compose, then hand the report to `notifier`. Delivery failure is recorded, not returned.
    pub async fn compose_and_deliver(
        &self,
        user_name: &str,
        topic: &str,
        transcript: &str,
        score: &MasteryScore,
        notifier: &dyn Notifier,
        delivery: &DeliverySettings,
    ) -> SessionReport {
        let mut report = self.compose(user_name, topic, transcript, score).await;
        report.delivery = deliver(&report, notifier, delivery).await;
        report
    }
}

/// Send a report. Errors are logged and folded into the returned status.
pub async fn deliver(
    report: &SessionReport,
    notifier: &dyn Notifier,
    settings: &DeliverySettings,
) -> Delivery {
    let notification = Notification {
        to: settings.recipient.clone(),
        subject: subject_line(
            &settings.app_name,
            &report.user_name,
            &report.topic,
            &report.score,
        ),
        body: report.text.clone(),
    };
    send_logged(notifier, &notification).await
}

/// Send one notification, logging the outcome instead of returning an error.
pub(crate) async fn send_logged(notifier: &dyn Notifier, notification: &Notification) -> Delivery {
    match notifier.send(notification).await {
        Ok(()) => {
            info!(notifier = notifier.name(), to = %notification.to, subject = %notification.subject, "notification sent");
            Delivery::Sent {
                to: notification.to.clone(),
            }
        }
        Err(e) => {
            warn!(notifier = notifier.name(), error = %e, "notification failed");
            Delivery::Failed {
                reason: e.to_string(),
            }
        }
    }
}
