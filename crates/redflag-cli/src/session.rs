use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use redflag_core::report::render_loading;
use redflag_core::{
    render_session, ClientSettings, EngineModel, FeedbackEmitter, FeedbackKind, FindingPresenter,
    HttpEngine, ResultView, SelectedFile, SessionState, WorkflowController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long `quit` waits for feedback still in flight.
const FEEDBACK_DRAIN: Duration = Duration::from_secs(3);

const HELP: &str = "\
Commands:
  select <path>        choose the contract PDF to analyze
  claude on|off        toggle the Claude backend
  gpt on|off           toggle the GPT backend
  analyze              send the selected file to the engine
  show                 redraw the current screen
  expand <n>           show or hide evidence for finding #n
  helpful <n>          mark finding #n as helpful
  unhelpful <n>        mark finding #n as not helpful
  reset                start over with a new file
  status               print the session state
  help                 show this message
  quit                 leave the session";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Select(PathBuf),
    Toggle(EngineModel, bool),
    Analyze,
    Show,
    Expand(usize),
    Feedback(usize, FeedbackKind),
    Reset,
    Status,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "select" | "open" => {
                if rest.is_empty() {
                    bail!("usage: select <path>");
                }
                Self::Select(PathBuf::from(rest))
            }
            "claude" => Self::Toggle(EngineModel::Claude, parse_switch(rest)?),
            "gpt" => Self::Toggle(EngineModel::Gpt, parse_switch(rest)?),
            "analyze" | "run" => Self::Analyze,
            "show" => Self::Show,
            "expand" => Self::Expand(parse_position(rest)?),
            "helpful" => Self::Feedback(parse_position(rest)?, FeedbackKind::Helpful),
            "unhelpful" => Self::Feedback(parse_position(rest)?, FeedbackKind::Unhelpful),
            "reset" | "new" => Self::Reset,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command `{other}` (type `help`)"),
        };
        Ok(Some(command))
    }
}

fn parse_switch(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => bail!("expected `on` or `off`"),
    }
}

fn parse_position(raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position),
        _ => bail!("expected a finding number like `1`"),
    }
}

/// Interactive session state: the workflow plus the live result screen.
pub struct Session {
    controller: WorkflowController,
    result_view: Option<ResultView>,
    engine: Arc<HttpEngine>,
    emitter: FeedbackEmitter,
    feedback_comment: String,
    in_flight: Vec<JoinHandle<()>>,
    color: bool,
}

impl Session {
    pub fn new(settings: &ClientSettings, color: bool) -> Result<Self> {
        let engine = Arc::new(HttpEngine::new(settings)?);
        let emitter = FeedbackEmitter::new(engine.clone());
        Ok(Self {
            controller: WorkflowController::new(settings.options),
            result_view: None,
            engine,
            emitter,
            feedback_comment: settings.feedback_comment.clone(),
            in_flight: Vec::new(),
            color,
        })
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        println!("Contract risk triage (engine at {})", self.engine.base_url());
        self.show()?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                println!();
                break;
            };
            match SessionCommand::parse(&line) {
                Ok(Some(SessionCommand::Quit)) => break,
                Ok(Some(command)) => self.apply(command).await?,
                Ok(None) => {}
                Err(err) => println!("{err}"),
            }
        }
        self.drain_feedback().await;
        Ok(())
    }

    async fn apply(&mut self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::Select(path) => {
                if self.controller.select_file(SelectedFile::new(path)) {
                    self.result_view = None;
                    self.show()?;
                } else {
                    println!("An analysis is already running.");
                }
            }
            SessionCommand::Toggle(model, enabled) => {
                if self.controller.set_engine_option(model, enabled) {
                    self.show()?;
                } else {
                    println!("Engine options are locked while analyzing.");
                }
            }
            SessionCommand::Analyze => {
                match self.controller.state() {
                    SessionState::FileSelected { .. } => {}
                    SessionState::Failed { .. } => {
                        println!("Select a file to retry.");
                        return Ok(());
                    }
                    _ => {
                        println!("Select a file first.");
                        return Ok(());
                    }
                }
                println!("{}", render_loading(self.color));
                self.controller.run_analysis(self.engine.as_ref()).await;
                self.result_view = self.controller.result_view();
                self.show()?;
            }
            SessionCommand::Show => self.show()?,
            SessionCommand::Expand(position) => {
                let Some(presenter) = self.presenter(position) else {
                    println!("No finding #{position}.");
                    return Ok(());
                };
                presenter.toggle_expand();
                self.show()?;
            }
            SessionCommand::Feedback(position, kind) => {
                let emitter = self.emitter.clone();
                let comment = self.feedback_comment.clone();
                let Some(presenter) = self.presenter(position) else {
                    println!("No finding #{position}.");
                    return Ok(());
                };
                let delivery = presenter.submit_feedback(kind, &emitter, &comment);
                self.in_flight.retain(|handle| !handle.is_finished());
                self.in_flight.extend(delivery);
                self.show()?;
            }
            SessionCommand::Reset => {
                if self.controller.reset() {
                    self.result_view = None;
                    self.show()?;
                } else {
                    println!("Nothing to reset yet.");
                }
            }
            SessionCommand::Status => {
                let options = self.controller.options();
                println!(
                    "state: {} | claude: {} | gpt: {}",
                    self.controller.state().name(),
                    on_off(options.use_claude),
                    on_off(options.use_gpt)
                );
            }
            SessionCommand::Help => println!("{HELP}"),
            SessionCommand::Quit => {}
        }
        Ok(())
    }

    fn presenter(&mut self, position: usize) -> Option<&mut FindingPresenter> {
        self.result_view
            .as_mut()
            .and_then(|view| view.presenter_mut(position))
    }

    fn show(&self) -> Result<()> {
        let screen = render_session(&self.controller, self.result_view.as_ref(), self.color)?;
        println!("{screen}");
        Ok(())
    }

    async fn drain_feedback(&mut self) {
        let pending: Vec<_> = self.in_flight.drain(..).collect();
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "waiting for feedback in flight");
        let wait = async {
            for handle in pending {
                if let Err(err) = handle.await {
                    warn!(error = %err, "feedback delivery task did not finish");
                }
            }
        };
        if tokio::time::timeout(FEEDBACK_DRAIN, wait).await.is_err() {
            warn!("feedback still in flight at exit was abandoned");
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
