use std::{cmp::Ordering, collections::BTreeMap, fmt, path::PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordinal risk category assigned by the analysis engine (CRITICAL highest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    /// Any label the client does not know, kept verbatim. Styled like `Low`.
    Unrecognized(String),
}

impl Severity {
    pub fn from_label(raw: &str) -> Self {
        match raw {
            "CRITICAL" => Self::Critical,
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unrecognized(raw) if raw.trim().is_empty() => "UNKNOWN",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_label(&raw))
    }
}

/// A single red flag reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identifier; feedback can only be recorded upstream when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub category: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Verbatim evidence text from the document.
    pub quote: String,
    /// Engine score within 0.0..=10.0. Display only.
    pub score: f64,
    pub recommendation: String,
}

/// Structured output of one `/analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_risk_score: f64,
    #[serde(default)]
    pub flags: Vec<Finding>,
    #[serde(default)]
    pub extracted_clauses: BTreeMap<String, Vec<String>>,
}

impl AnalysisResult {
    /// Findings in display order: descending score, ties keep engine order.
    pub fn ranked_flags(&self) -> Vec<&Finding> {
        let mut ranked: Vec<&Finding> = self.flags.iter().collect();
        // `sort_by` is stable, which is what preserves the tie order.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }

    pub fn count_by_severity(&self, severity: &Severity) -> usize {
        self.flags
            .iter()
            .filter(|flag| &flag.severity == severity)
            .count()
    }
}

/// The two engine backends the user can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineModel {
    Claude,
    Gpt,
}

impl EngineModel {
    pub const ALL: [Self; 2] = [Self::Claude, Self::Gpt];

    pub fn form_field(self) -> &'static str {
        match self {
            Self::Claude => "use_claude",
            Self::Gpt => "use_gpt",
        }
    }
}

/// Which backends participate in the hybrid pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub use_claude: bool,
    pub use_gpt: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_claude: true,
            use_gpt: true,
        }
    }
}

impl EngineOptions {
    pub fn set(&mut self, model: EngineModel, enabled: bool) {
        match model {
            EngineModel::Claude => self.use_claude = enabled,
            EngineModel::Gpt => self.use_gpt = enabled,
        }
    }

    pub fn get(&self, model: EngineModel) -> bool {
        match model {
            EngineModel::Claude => self.use_claude,
            EngineModel::Gpt => self.use_gpt,
        }
    }
}

/// Reference to the document the user picked. Contents are read lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Payload sent to `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file_name: String,
    pub payload: Vec<u8>,
    pub options: EngineOptions,
}

/// The user's helpfulness judgment on one finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Helpful,
    Unhelpful,
}

impl FeedbackKind {
    pub fn is_helpful(self) -> bool {
        matches!(self, Self::Helpful)
    }
}

/// Body of `POST /flag/{finding_id}/feedback`, plus the id addressing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEvent {
    #[serde(skip_serializing)]
    pub finding_id: String,
    pub is_helpful: bool,
    pub comments: String,
}

impl FeedbackEvent {
    pub fn new(finding_id: impl Into<String>, kind: FeedbackKind, comments: impl Into<String>) -> Self {
        Self {
            finding_id: finding_id.into(),
            is_helpful: kind.is_helpful(),
            comments: comments.into(),
        }
    }
}
