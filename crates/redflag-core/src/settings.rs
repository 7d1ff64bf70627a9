use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use crate::model::EngineOptions;

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";
pub const DEFAULT_FEEDBACK_COMMENT: &str = "User feedback from GUI";

/// Client configuration: where the engine lives and how requests are shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub engine_url: String,
    /// Transport timeout; `None` leaves it to the HTTP stack.
    pub timeout: Option<Duration>,
    pub feedback_comment: String,
    /// Initial engine toggles for a new session.
    pub options: EngineOptions,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            timeout: None,
            feedback_comment: DEFAULT_FEEDBACK_COMMENT.to_string(),
            options: EngineOptions::default(),
        }
    }
}

impl ClientSettings {
    const ENGINE_URL_ENV: &'static str = "REDFLAG_ENGINE_URL";
    const TIMEOUT_ENV: &'static str = "REDFLAG_TIMEOUT";
    const FEEDBACK_COMMENT_ENV: &'static str = "REDFLAG_FEEDBACK_COMMENT";
    const USE_CLAUDE_ENV: &'static str = "REDFLAG_USE_CLAUDE";
    const USE_GPT_ENV: &'static str = "REDFLAG_USE_GPT";

    /// Load settings from environment variables.
    ///
    /// * `REDFLAG_ENGINE_URL`: engine base address (default: `http://localhost:8000`).
    /// * `REDFLAG_TIMEOUT`: transport timeout, humantime syntax (`30s`, `2m`).
    /// * `REDFLAG_FEEDBACK_COMMENT`: comment attached to feedback events.
    /// * `REDFLAG_USE_CLAUDE` / `REDFLAG_USE_GPT`: initial engine toggles.
    pub fn from_env() -> Result<Self> {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self::from_map(vars)
    }

    fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let engine_url = non_empty(Self::ENGINE_URL_ENV).unwrap_or(defaults.engine_url);
        let timeout = non_empty(Self::TIMEOUT_ENV)
            .map(|raw| {
                humantime::parse_duration(&raw)
                    .with_context(|| format!("{} must be a duration like `30s` (got `{raw}`)", Self::TIMEOUT_ENV))
            })
            .transpose()?;
        let feedback_comment = vars
            .get(Self::FEEDBACK_COMMENT_ENV)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.feedback_comment);
        let use_claude = non_empty(Self::USE_CLAUDE_ENV)
            .map(|raw| parse_flag(Self::USE_CLAUDE_ENV, &raw))
            .transpose()?
            .unwrap_or(defaults.options.use_claude);
        let use_gpt = non_empty(Self::USE_GPT_ENV)
            .map(|raw| parse_flag(Self::USE_GPT_ENV, &raw))
            .transpose()?
            .unwrap_or(defaults.options.use_gpt);

        Ok(Self {
            engine_url,
            timeout,
            feedback_comment,
            options: EngineOptions {
                use_claude,
                use_gpt,
            },
        })
    }
}

/// Accepts the usual spellings of a boolean switch.
pub fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{name} must be a boolean (got `{other}`)"),
    }
}
