use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Url,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::feedback::FeedbackSink;
use crate::model::{AnalysisRequest, AnalysisResult, EngineModel, FeedbackEvent};
use crate::settings::ClientSettings;

/// Message shown to the user when the engine answers with a non-success status.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Analysis failed. Please check the backend connection.";

/// Failures at the HTTP boundary with the analysis engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request to analysis engine failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("analysis engine returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode analysis engine response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl EngineError {
    /// Text suitable for the upload view's error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { .. } => ANALYSIS_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// The remote service that turns a document into findings.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Submit one document for analysis.
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, EngineError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// reqwest-backed client for the engine's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    http: Client,
    base: Url,
}

impl HttpEngine {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base = Url::parse(settings.engine_url.trim())
            .with_context(|| format!("invalid engine url `{}`", settings.engine_url))?;
        if base.cannot_be_a_base() {
            bail!("engine url `{}` cannot be used as a base address", base);
        }
        let mut builder = Client::builder().user_agent(concat!("redflag/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build engine HTTP client")?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Probe `GET /health`.
    #[instrument(name = "engine_health", skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, EngineError> {
        let response = self.http.get(self.endpoint(&["health"])).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalysisEngine for HttpEngine {
    #[instrument(
        name = "engine_analyze",
        skip(self, request),
        fields(file = %request.file_name, bytes = request.payload.len())
    )]
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        let AnalysisRequest {
            file_name,
            payload,
            options,
        } = request;
        let part = Part::bytes(payload)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = EngineModel::ALL
            .into_iter()
            .fold(Form::new().part("file", part), |form, model| {
                form.text(model.form_field(), options.get(model).to_string())
            });

        info!(use_claude = options.use_claude, use_gpt = options.use_gpt, "submitting document");
        let response = self
            .http
            .post(self.endpoint(&["analyze"]))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let result: AnalysisResult = serde_json::from_str(&body)?;
        debug!(
            flags = result.flags.len(),
            overall = result.overall_risk_score,
            "analysis received"
        );
        Ok(result)
    }
}

#[async_trait]
impl FeedbackSink for HttpEngine {
    async fn send_feedback(&self, event: &FeedbackEvent) -> Result<(), EngineError> {
        let url = self.endpoint(&["flag", event.finding_id.as_str(), "feedback"]);
        let response = self.http.post(url).json(event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }
}
