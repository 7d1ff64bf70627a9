use serde::Serialize;
use tracing::debug;

use crate::model::{AnalysisResult, Severity};
use crate::presenter::FindingPresenter;
use crate::visual::{gauge_color, gauge_geometry, GaugeGeometry, Tone};

/// The one screen visible for a given session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Upload,
    Loading,
    Result,
}

/// Sidebar entry for one recognised clause category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseSummary {
    pub key: String,
    pub label: String,
    pub occurrences: usize,
}

/// Everything the result screen shows, with one presenter per finding in
/// display order.
#[derive(Debug, Clone)]
pub struct ResultView {
    pub overall_risk_score: f64,
    pub gauge: GaugeGeometry,
    pub gauge_tone: Tone,
    pub critical_flags: usize,
    pub high_flags: usize,
    pub clauses: Vec<ClauseSummary>,
    presenters: Vec<FindingPresenter>,
}

impl ResultView {
    pub fn new(result: &AnalysisResult) -> Self {
        for flag in &result.flags {
            if !flag.severity.is_recognized() {
                debug!(title = %flag.title, severity = %flag.severity, "unrecognized severity, styled as LOW");
            }
        }
        let presenters = result
            .ranked_flags()
            .into_iter()
            .cloned()
            .map(FindingPresenter::new)
            .collect();
        let clauses = result
            .extracted_clauses
            .iter()
            .map(|(key, sentences)| ClauseSummary {
                key: key.clone(),
                label: clause_label(key),
                occurrences: sentences.len(),
            })
            .collect();
        Self {
            overall_risk_score: result.overall_risk_score,
            gauge: gauge_geometry(result.overall_risk_score),
            gauge_tone: gauge_color(result.overall_risk_score),
            critical_flags: result.count_by_severity(&Severity::Critical),
            high_flags: result.count_by_severity(&Severity::High),
            clauses,
            presenters,
        }
    }

    pub fn presenters(&self) -> &[FindingPresenter] {
        &self.presenters
    }

    /// Presenter at 1-based display `position`, as shown to the user.
    pub fn presenter_mut(&mut self, position: usize) -> Option<&mut FindingPresenter> {
        position
            .checked_sub(1)
            .and_then(|idx| self.presenters.get_mut(idx))
    }

    pub fn has_findings(&self) -> bool {
        !self.presenters.is_empty()
    }
}

/// `governing_law` -> `Governing Law`.
pub fn clause_label(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
