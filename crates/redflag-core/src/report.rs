use std::fmt::Write;

use serde::Serialize;

use crate::model::{FeedbackKind, Finding};
use crate::view::{ClauseSummary, ResultView, View};
use crate::visual::{format_score, paint, Tone};
use crate::workflow::{SessionState, WorkflowController};

const GAUGE_WIDTH: usize = 20;

/// Format styles supported by the result renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Render whichever screen the controller's state calls for.
///
/// `result_view` carries presenter state across renders; when absent a fresh
/// view is built from the completed result.
pub fn render_session(
    controller: &WorkflowController,
    result_view: Option<&ResultView>,
    color: bool,
) -> anyhow::Result<String> {
    match controller.view() {
        View::Upload => render_upload(controller, color),
        View::Loading => Ok(render_loading(color)),
        View::Result => match result_view {
            Some(view) => render_report(view, OutputFormat::Human, color),
            None => match controller.result_view() {
                Some(view) => render_report(&view, OutputFormat::Human, color),
                None => render_upload(controller, color),
            },
        },
    }
}

pub fn render_upload(controller: &WorkflowController, color: bool) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", paint("Upload Contract PDF", Tone::Primary, None, color))?;
    writeln!(
        out,
        "Upload a legal agreement (PDF) to identify risks, missing clauses, and red flags using our hybrid AI engine."
    )?;
    writeln!(out)?;
    match controller.selected_file() {
        Some(file) => writeln!(out, "Selected file: {}", file.name())?,
        None => writeln!(out, "No file selected.")?,
    }
    let options = controller.options();
    writeln!(out, "{} Use Claude 3.5 Sonnet", checkbox(options.use_claude))?;
    writeln!(out, "{} Use GPT-4o", checkbox(options.use_gpt))?;
    match controller.state() {
        SessionState::FileSelected { .. } => writeln!(out, "Ready to run analysis.")?,
        SessionState::Failed { error, .. } => {
            writeln!(out)?;
            writeln!(out, "{}", paint(error, Tone::White, Some(Tone::Danger), color))?;
            writeln!(out, "Select a file to retry.")?;
        }
        _ => {}
    }
    Ok(out)
}

pub fn render_loading(color: bool) -> String {
    format!(
        "{}\nExtracting text, running heuristic rules, and querying LLMs.\n",
        paint("Analyzing Contract...", Tone::Primary, None, color)
    )
}

/// Produce the result screen from a `ResultView` in the desired format.
pub fn render_report(view: &ResultView, format: OutputFormat, color: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(view, color),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(view))?),
    }
}

fn render_human(view: &ResultView, color: bool) -> anyhow::Result<String> {
    let mut out = String::new();
    let score = format_score(view.overall_risk_score);
    writeln!(out, "Overall Risk Score")?;
    writeln!(
        out,
        "  {score} [{bar}] RISK LEVEL",
        score = paint(&score, view.gauge_tone, None, color),
        bar = paint(&view.gauge.bar(GAUGE_WIDTH), view.gauge_tone, None, color),
    )?;
    writeln!(
        out,
        "  Critical Flags: {}",
        paint(&view.critical_flags.to_string(), Tone::Danger, None, color)
    )?;
    writeln!(
        out,
        "  High Flags: {}",
        paint(&view.high_flags.to_string(), Tone::Warning, None, color)
    )?;
    writeln!(out)?;

    writeln!(out, "Extracted Clauses")?;
    if view.clauses.is_empty() {
        writeln!(out, "  No standard clauses found.")?;
    } else {
        for clause in &view.clauses {
            writeln!(
                out,
                "  {label}: {count} occurrence(s)",
                label = paint(&clause.label, Tone::Primary, None, color),
                count = clause.occurrences
            )?;
        }
    }
    writeln!(out)?;

    let presenters = view.presenters();
    writeln!(
        out,
        "Analysis Report ({} risks identified)",
        presenters.len()
    )?;
    if !view.has_findings() {
        writeln!(
            out,
            "  {} No Significant Red Flags Found",
            paint("✔", Tone::Success, None, color)
        )?;
        writeln!(
            out,
            "  The contract appears to be standard based on our current rule set."
        )?;
        return Ok(out);
    }
    for (idx, presenter) in presenters.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "#{}", idx + 1)?;
        presenter.render(&mut out, color)?;
    }

    Ok(out)
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    overall_risk_score: f64,
    gauge_color: &'static str,
    gauge_fraction: f64,
    critical_flags: usize,
    high_flags: usize,
    extracted_clauses: &'a [ClauseSummary],
    findings: Vec<JsonFinding<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonFinding<'a> {
    position: usize,
    #[serde(flatten)]
    finding: &'a Finding,
    expanded: bool,
    feedback: Option<FeedbackKind>,
}

impl<'a> From<&'a ResultView> for JsonReport<'a> {
    fn from(view: &'a ResultView) -> Self {
        Self {
            overall_risk_score: view.overall_risk_score,
            gauge_color: view.gauge_tone.hex(),
            gauge_fraction: view.gauge.fraction,
            critical_flags: view.critical_flags,
            high_flags: view.high_flags,
            extracted_clauses: &view.clauses,
            findings: view
                .presenters()
                .iter()
                .enumerate()
                .map(|(idx, presenter)| JsonFinding {
                    position: idx + 1,
                    finding: presenter.finding(),
                    expanded: presenter.is_expanded(),
                    feedback: presenter.feedback(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::finding;
    use crate::model::{AnalysisResult, SelectedFile, Severity};
    use std::collections::BTreeMap;

    fn sample_view() -> ResultView {
        ResultView::new(&AnalysisResult {
            overall_risk_score: 8.0,
            flags: vec![
                finding(Some("low"), Severity::Low, 2.0),
                finding(Some("crit"), Severity::Critical, 9.0),
            ],
            extracted_clauses: BTreeMap::new(),
        })
    }

    #[test]
    fn human_report_orders_findings() {
        let output = render_report(&sample_view(), OutputFormat::Human, false).unwrap();
        assert!(output.contains("Overall Risk Score"));
        assert!(output.contains("2 risks identified"));
        assert!(output.contains("No standard clauses found."));
        let critical = output.find(" CRITICAL ").unwrap();
        let low = output.find(" LOW ").unwrap();
        assert!(critical < low);
    }

    #[test]
    fn empty_findings_show_explicit_indicator() {
        let view = ResultView::new(&AnalysisResult {
            overall_risk_score: 1.0,
            flags: Vec::new(),
            extracted_clauses: BTreeMap::new(),
        });
        let output = render_report(&view, OutputFormat::Human, false).unwrap();
        assert!(output.contains("No Significant Red Flags Found"));
        assert!(!output.contains("#1"));
    }

    #[test]
    fn json_report_serializes() {
        let output = render_report(&sample_view(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["gauge_color"], "#FF00FF");
        assert_eq!(value["findings"][0]["id"], "crit");
        assert_eq!(value["findings"][0]["severity"], "CRITICAL");
        assert_eq!(value["findings"][0]["position"], 1);
        assert!(value["findings"][1]["feedback"].is_null());
    }

    #[test]
    fn session_renders_exactly_one_view() {
        let mut controller = WorkflowController::default();
        let upload = render_session(&controller, None, false).unwrap();
        assert!(upload.contains("Upload Contract PDF"));
        assert!(upload.contains("No file selected."));

        controller.select_file(SelectedFile::new("/tmp/nda.pdf"));
        controller.begin_analysis().unwrap();
        let loading = render_session(&controller, None, false).unwrap();
        assert!(loading.contains("Analyzing Contract..."));
        assert!(!loading.contains("Upload Contract PDF"));

        controller.complete_analysis(Err("Analysis failed. Please check the backend connection.".into()));
        let failed = render_session(&controller, None, false).unwrap();
        assert!(failed.contains("Selected file: nda.pdf"));
        assert!(failed.contains("Analysis failed."));
        assert!(!failed.contains("Overall Risk Score"));
    }

    #[test]
    fn failed_screen_offers_only_what_the_controller_accepts() {
        let mut controller = WorkflowController::default();
        controller.select_file(SelectedFile::new("/tmp/nda.pdf"));
        let ready = render_session(&controller, None, false).unwrap();
        assert!(ready.contains("Ready to run analysis."));

        controller.begin_analysis().unwrap();
        controller.complete_analysis(Err("engine down".into()));
        let failed = render_session(&controller, None, false).unwrap();
        assert!(failed.contains("engine down"));
        assert!(failed.contains("Select a file to retry."));
        assert!(!failed.contains("Ready to run analysis."));
        assert!(controller.clone().begin_analysis().is_none());

        controller.select_file(SelectedFile::new("/tmp/nda.pdf"));
        let retry = render_session(&controller, None, false).unwrap();
        assert!(retry.contains("Ready to run analysis."));
        assert!(!retry.contains("engine down"));
        assert!(controller.begin_analysis().is_some());
    }
}
