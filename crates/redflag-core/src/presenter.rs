use std::fmt::{self, Write};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::feedback::FeedbackEmitter;
use crate::model::{FeedbackEvent, FeedbackKind, Finding};
use crate::visual::{accent_color, badge, format_score, paint, Tone};

pub const EXPAND_LABEL: &str = "View Details & Evidence";
pub const COLLAPSE_LABEL: &str = "Show Less";

/// Interactive card for one finding.
///
/// Each presenter owns only its own `expanded` and `feedback` flags; the
/// finding itself is never modified.
#[derive(Debug, Clone)]
pub struct FindingPresenter {
    finding: Finding,
    expanded: bool,
    feedback: Option<FeedbackKind>,
}

impl FindingPresenter {
    pub fn new(finding: Finding) -> Self {
        Self {
            finding,
            expanded: false,
            feedback: None,
        }
    }

    pub fn finding(&self) -> &Finding {
        &self.finding
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn feedback(&self) -> Option<FeedbackKind> {
        self.feedback
    }

    /// Flip between the collapsed and detailed card. Returns the new state.
    pub fn toggle_expand(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            COLLAPSE_LABEL
        } else {
            EXPAND_LABEL
        }
    }

    /// Record the user's judgment locally and, when the finding has an id,
    /// notify the engine in the background.
    ///
    /// The local choice is set before anything is sent and is kept whatever
    /// the delivery outcome. Returns the delivery task, if one was spawned.
    pub fn submit_feedback(
        &mut self,
        kind: FeedbackKind,
        emitter: &FeedbackEmitter,
        comments: &str,
    ) -> Option<JoinHandle<()>> {
        self.feedback = Some(kind);
        match self.finding.id.as_deref() {
            Some(id) => Some(emitter.send(FeedbackEvent::new(id, kind, comments))),
            None => {
                debug!(title = %self.finding.title, "finding has no id; feedback kept locally");
                None
            }
        }
    }

    /// Write the card as terminal text.
    pub fn render(&self, out: &mut String, color: bool) -> fmt::Result {
        let finding = &self.finding;
        let edge = paint("┃", accent_color(&finding.severity), None, color);

        writeln!(
            out,
            "{edge} {badge} {category}  {score}/10",
            badge = badge(&finding.severity, color),
            category = finding.category.to_uppercase(),
            score = paint(&format_score(finding.score), Tone::Primary, None, color),
        )?;
        writeln!(out, "{edge} {}", finding.title)?;
        writeln!(out, "{edge} {}", finding.description)?;

        if self.expanded {
            writeln!(out, "{edge}")?;
            writeln!(out, "{edge}   EXTRACTED TEXT")?;
            writeln!(out, "{edge}   \"{}\"", single_line(&finding.quote))?;
            writeln!(out, "{edge}   Recommendation: {}", finding.recommendation)?;
            writeln!(
                out,
                "{edge}   {} {}",
                self.feedback_button(FeedbackKind::Helpful, color),
                self.feedback_button(FeedbackKind::Unhelpful, color)
            )?;
        }

        let arrow = if self.expanded { "▴" } else { "▾" };
        writeln!(out, "{edge} {arrow} {}", self.toggle_label())
    }

    fn feedback_button(&self, kind: FeedbackKind, color: bool) -> String {
        let (label, tone) = match kind {
            FeedbackKind::Helpful => ("Helpful", Tone::Success),
            FeedbackKind::Unhelpful => ("Not Helpful", Tone::Danger),
        };
        if self.feedback == Some(kind) {
            let text = format!("[● {label}]");
            let fg = match kind {
                FeedbackKind::Helpful => Tone::Text,
                FeedbackKind::Unhelpful => Tone::White,
            };
            paint(&text, fg, Some(tone), color)
        } else {
            paint(&format!("[○ {label}]"), tone, None, color)
        }
    }
}

fn single_line(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}
