use std::{fs, io::Write, path::PathBuf};

use async_trait::async_trait;
use insta::assert_snapshot;
use redflag_core::{
    render_report, AnalysisEngine, AnalysisRequest, AnalysisResult, EngineError, OutputFormat,
    ResultView, SelectedFile, SessionState, Severity, View, WorkflowController,
};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(name: &str) -> AnalysisResult {
    let path = fixture_dir().join(name);
    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()));
    serde_json::from_str(&raw)
        .unwrap_or_else(|err| panic!("fixture {} is not a valid result: {err}", path.display()))
}

/// Engine that answers every request with a fixture file.
struct FixtureEngine {
    fixture: &'static str,
}

#[async_trait]
impl AnalysisEngine for FixtureEngine {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        Ok(load_fixture(self.fixture))
    }
}

#[test]
fn contract_report_snapshot() {
    let mut view = ResultView::new(&load_fixture("contract_result.json"));
    view.presenter_mut(1).unwrap().toggle_expand();
    let output = render_report(&view, OutputFormat::Human, false).unwrap();
    assert_snapshot!("contract_report", output);
}

#[test]
fn clean_report_snapshot() {
    let view = ResultView::new(&load_fixture("clean_result.json"));
    let output = render_report(&view, OutputFormat::Human, false).unwrap();
    assert_snapshot!("clean_report", output);
}

#[tokio::test(flavor = "current_thread")]
async fn select_analyze_render() {
    let mut pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    pdf.write_all(b"%PDF-1.4").unwrap();

    let engine = FixtureEngine {
        fixture: "contract_result.json",
    };
    let mut controller = WorkflowController::default();
    controller.select_file(SelectedFile::new(pdf.path()));
    assert!(controller.run_analysis(&engine).await);

    assert!(matches!(controller.state(), SessionState::Completed { .. }));
    assert_eq!(controller.view(), View::Result);
    let view = controller.result_view().unwrap();
    let order: Vec<_> = view
        .presenters()
        .iter()
        .map(|p| p.finding().severity.clone())
        .collect();
    assert_eq!(
        order,
        vec![Severity::Critical, Severity::Medium, Severity::Low]
    );

    assert!(controller.reset());
    assert_eq!(controller.view(), View::Upload);
}
