mod session;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use redflag_core::{
    render_report, ClientSettings, EngineModel, HttpEngine, OutputFormat, SelectedFile,
    WorkflowController,
};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "redflag",
    author,
    version,
    about = "Contract risk triage client"
)]
struct Cli {
    /// Optional configuration file (TOML, YAML or JSON) with an `[engine]` table
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Base address of the analysis engine
    #[arg(long = "engine-url", value_name = "URL", global = true)]
    engine_url: Option<String>,

    /// Transport timeout, e.g. `30s`
    #[arg(long, value_name = "DURATION", global = true)]
    timeout: Option<String>,

    /// When to use terminal colors
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one contract and print the report
    Analyze {
        /// Contract PDF to upload
        file: PathBuf,
        /// Leave the Claude backend out of the pipeline
        #[arg(long)]
        no_claude: bool,
        /// Leave the GPT backend out of the pipeline
        #[arg(long)]
        no_gpt: bool,
        /// Emit the report as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
        /// Show evidence and recommendations for every finding
        #[arg(long)]
        expand: bool,
    },
    /// Check that the analysis engine is reachable
    Health,
    /// Interactive upload → analyze → review session (default)
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        }
    }
}

/// Shape of the optional `--config` file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    engine: EngineSection,
}

#[derive(Debug, Default, Deserialize)]
struct EngineSection {
    url: Option<String>,
    timeout: Option<String>,
    feedback_comment: Option<String>,
    use_claude: Option<bool>,
    use_gpt: Option<bool>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let color = cli.color.enabled();
    colored::control::set_override(color);

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Analyze {
            file,
            no_claude,
            no_gpt,
            json,
            expand,
        } => {
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            analyze(&settings, file, no_claude, no_gpt, format, expand, color).await?
        }
        Commands::Health => health(&settings).await?,
        Commands::Session => Session::new(&settings, color)?.run().await?,
    }
    Ok(())
}

/// Environment first, then the config file, then command-line flags.
fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = ClientSettings::from_env()?;
    if let Some(path) = &cli.config {
        apply_file_config(&mut settings, load_file_config(path)?)?;
    }
    if let Some(url) = &cli.engine_url {
        settings.engine_url = url.clone();
    }
    if let Some(raw) = &cli.timeout {
        settings.timeout = Some(parse_timeout(raw)?);
    }
    debug!(
        engine_url = %settings.engine_url,
        timeout = ?settings.timeout,
        use_claude = settings.options.use_claude,
        use_gpt = settings.options.use_gpt,
        "settings resolved"
    );
    Ok(settings)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to load config file {}", path.display()))?;
    config
        .try_deserialize()
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn apply_file_config(settings: &mut ClientSettings, file: FileConfig) -> Result<()> {
    let engine = file.engine;
    if let Some(url) = engine.url {
        settings.engine_url = url;
    }
    if let Some(raw) = engine.timeout {
        settings.timeout = Some(parse_timeout(&raw)?);
    }
    if let Some(comment) = engine.feedback_comment {
        settings.feedback_comment = comment;
    }
    if let Some(enabled) = engine.use_claude {
        settings.options.use_claude = enabled;
    }
    if let Some(enabled) = engine.use_gpt {
        settings.options.use_gpt = enabled;
    }
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<std::time::Duration> {
    humantime::parse_duration(raw.trim())
        .with_context(|| format!("invalid timeout `{raw}` (expected e.g. `30s`)"))
}

async fn analyze(
    settings: &ClientSettings,
    file: PathBuf,
    no_claude: bool,
    no_gpt: bool,
    format: OutputFormat,
    expand: bool,
    color: bool,
) -> Result<()> {
    let engine = HttpEngine::new(settings)?;
    let mut controller = WorkflowController::new(settings.options);
    if no_claude {
        controller.set_engine_option(EngineModel::Claude, false);
    }
    if no_gpt {
        controller.set_engine_option(EngineModel::Gpt, false);
    }
    controller.select_file(SelectedFile::new(file));
    controller.run_analysis(&engine).await;

    if let Some(error) = controller.error() {
        bail!("{error}");
    }
    let mut view = controller
        .result_view()
        .context("analysis finished without a result")?;
    if expand {
        for position in 1..=view.presenters().len() {
            if let Some(presenter) = view.presenter_mut(position) {
                presenter.toggle_expand();
            }
        }
    }
    print!("{}", render_report(&view, format, color)?);
    if matches!(format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}

async fn health(settings: &ClientSettings) -> Result<()> {
    let engine = HttpEngine::new(settings)?;
    println!("Checking engine at {} ...", engine.base_url());
    let status = engine
        .health()
        .await
        .with_context(|| format!("engine at {} is not reachable", engine.base_url()))?;
    println!("status: {}", status.status);
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_overrides_settings() {
        let mut settings = ClientSettings::default();
        let file = FileConfig {
            engine: EngineSection {
                url: Some("http://engine:9000".into()),
                timeout: Some("2m".into()),
                feedback_comment: None,
                use_claude: Some(false),
                use_gpt: None,
            },
        };
        apply_file_config(&mut settings, file).unwrap();
        assert_eq!(settings.engine_url, "http://engine:9000");
        assert_eq!(settings.timeout, Some(std::time::Duration::from_secs(120)));
        assert!(!settings.options.use_claude);
        assert!(settings.options.use_gpt);
    }

    #[test]
    fn bad_timeout_is_reported() {
        let err = parse_timeout("whenever").unwrap_err();
        assert!(err.to_string().contains("invalid timeout"));
    }

    #[test]
    fn cli_defaults_to_session() {
        let cli = Cli::parse_from(["redflag"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.color, ColorChoice::Auto);
    }
}
