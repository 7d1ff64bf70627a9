pub mod engine;
pub mod feedback;
pub mod model;
pub mod presenter;
pub mod report;
pub mod settings;
pub mod view;
pub mod visual;
pub mod workflow;

pub use engine::{AnalysisEngine, EngineError, HealthStatus, HttpEngine};
pub use feedback::{FeedbackEmitter, FeedbackSink};
pub use model::{
    AnalysisRequest, AnalysisResult, EngineModel, EngineOptions, FeedbackEvent, FeedbackKind,
    Finding, SelectedFile, Severity,
};
pub use presenter::FindingPresenter;
pub use report::{render_report, render_session, OutputFormat};
pub use settings::ClientSettings;
pub use view::{ResultView, View};
pub use workflow::{SessionState, WorkflowController};
