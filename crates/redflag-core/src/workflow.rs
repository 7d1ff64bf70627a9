use std::io;

use tracing::{debug, info, instrument, warn};

use crate::engine::AnalysisEngine;
use crate::model::{AnalysisRequest, AnalysisResult, EngineModel, EngineOptions, SelectedFile};
use crate::view::{ResultView, View};

/// Lifecycle of one upload → analyze → render session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NoFile,
    FileSelected { file: SelectedFile },
    Analyzing { file: SelectedFile },
    Completed {
        file: SelectedFile,
        result: AnalysisResult,
    },
    Failed { file: SelectedFile, error: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoFile => "no-file",
            Self::FileSelected { .. } => "file-selected",
            Self::Analyzing { .. } => "analyzing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Ticket for an analysis that has been started but not yet sent.
///
/// Only [`WorkflowController::begin_analysis`] hands these out, one per
/// `FileSelected → Analyzing` transition.
#[derive(Debug)]
pub struct PendingAnalysis {
    file: SelectedFile,
    options: EngineOptions,
}

impl PendingAnalysis {
    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Read the selected file and package it with the engine options.
    pub async fn load(&self) -> io::Result<AnalysisRequest> {
        let payload = tokio::fs::read(&self.file.path).await?;
        Ok(AnalysisRequest {
            file_name: self.file.name(),
            payload,
            options: self.options,
        })
    }
}

/// Owns session state and drives the analysis request.
#[derive(Debug, Clone)]
pub struct WorkflowController {
    state: SessionState,
    options: EngineOptions,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl WorkflowController {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            state: SessionState::NoFile,
            options,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, SessionState::Analyzing { .. })
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match &self.state {
            SessionState::NoFile => None,
            SessionState::FileSelected { file }
            | SessionState::Analyzing { file }
            | SessionState::Completed { file, .. }
            | SessionState::Failed { file, .. } => Some(file),
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Which screen the current state shows. A failure returns to the upload
    /// screen with the error displayed.
    pub fn view(&self) -> View {
        match self.state {
            SessionState::NoFile
            | SessionState::FileSelected { .. }
            | SessionState::Failed { .. } => View::Upload,
            SessionState::Analyzing { .. } => View::Loading,
            SessionState::Completed { .. } => View::Result,
        }
    }

    /// Fresh presenters for the completed result, if any.
    pub fn result_view(&self) -> Option<ResultView> {
        self.result().map(ResultView::new)
    }

    /// Choose the document to analyze, replacing any previous selection and
    /// clearing a previous error. Ignored while an analysis is in flight.
    pub fn select_file(&mut self, file: SelectedFile) -> bool {
        if self.is_analyzing() {
            debug!("file selection ignored while analyzing");
            return false;
        }
        info!(file = %file.path.display(), "file selected");
        self.state = SessionState::FileSelected { file };
        true
    }

    /// Enable or disable one engine backend. Ignored while analyzing.
    pub fn set_engine_option(&mut self, model: EngineModel, enabled: bool) -> bool {
        if self.is_analyzing() {
            debug!(option = model.form_field(), "engine option locked while analyzing");
            return false;
        }
        self.options.set(model, enabled);
        true
    }

    /// `FileSelected → Analyzing`. Returns `None` in any other state, so a
    /// second call while a request is in flight does nothing.
    pub fn begin_analysis(&mut self) -> Option<PendingAnalysis> {
        let file = match &self.state {
            SessionState::FileSelected { file } => file.clone(),
            other => {
                debug!(state = other.name(), "start analysis ignored");
                return None;
            }
        };
        info!(
            file = %file.name(),
            use_claude = self.options.use_claude,
            use_gpt = self.options.use_gpt,
            "analysis started"
        );
        self.state = SessionState::Analyzing { file: file.clone() };
        Some(PendingAnalysis {
            file,
            options: self.options,
        })
    }

    /// `Analyzing → Completed | Failed`. Ignored in any other state.
    pub fn complete_analysis(&mut self, outcome: Result<AnalysisResult, String>) {
        let file = match &self.state {
            SessionState::Analyzing { file } => file.clone(),
            other => {
                warn!(state = other.name(), "analysis outcome arrived outside of analyzing");
                return;
            }
        };
        self.state = match outcome {
            Ok(result) => {
                info!(
                    flags = result.flags.len(),
                    overall = result.overall_risk_score,
                    "analysis completed"
                );
                SessionState::Completed { file, result }
            }
            Err(error) => {
                warn!(%error, "analysis failed");
                SessionState::Failed { file, error }
            }
        };
    }

    /// Start the analysis and await the engine. Returns `false` when the
    /// current state does not allow starting one.
    #[instrument(name = "run_analysis", skip(self, engine), fields(state = self.state.name()))]
    pub async fn run_analysis<E>(&mut self, engine: &E) -> bool
    where
        E: AnalysisEngine + ?Sized,
    {
        let Some(pending) = self.begin_analysis() else {
            return false;
        };
        let outcome = match pending.load().await {
            Ok(request) => engine
                .analyze(request)
                .await
                .map_err(|err| err.user_message()),
            Err(err) => Err(format!("Failed to read {}: {err}", pending.file().name())),
        };
        self.complete_analysis(outcome);
        true
    }

    /// Start over: drop the file, the result and any error. Only valid once
    /// an analysis has finished.
    pub fn reset(&mut self) -> bool {
        match self.state {
            SessionState::Completed { .. } | SessionState::Failed { .. } => {
                info!("session reset");
                self.state = SessionState::NoFile;
                true
            }
            _ => false,
        }
    }
}
