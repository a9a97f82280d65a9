use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use dlwatch_client::{DownloaderApi, EffectRunner, Scheduler, TokioScheduler};
use dlwatch_core::{update, AppState, Msg, SubmitOutcome, TrackerPhase};
use tokio::sync::mpsc;
use watch_logging::{watch_debug, watch_info};

use crate::cli::WatchArgs;
use crate::config::AppConfig;
use crate::render::TextRenderer;

const HELP: &str = "\
paste a URL to submit it, or one of:
  :track ID        follow a job started elsewhere
  :stop            stop following the current job
  :clear           clear the log view
  :clear-url       clear the URL field
  :preset NAME     choose the format preset
  :cookies on|off  use the server's cookies file
  :refresh         reload the file listing
  :quit            exit";

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Dispatch(Vec<Msg>),
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Dispatch(vec![
            Msg::UrlInputChanged(line.to_string()),
            Msg::SubmitClicked,
        ]);
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let msgs = match (name, arg) {
        ("q" | "quit", _) => return Input::Quit,
        ("h" | "help", _) => return Input::Help,
        ("stop", "") => vec![Msg::StopTrackingClicked],
        ("clear", "") => vec![Msg::ClearLogClicked],
        ("clear-url", "") => vec![Msg::ClearUrlClicked],
        ("refresh", "") => vec![Msg::RefreshFilesClicked],
        ("track", id) if !id.is_empty() => vec![Msg::TrackJob(id.to_string())],
        ("preset", preset) if !preset.is_empty() => vec![Msg::PresetSelected(preset.to_string())],
        ("cookies", "on") => vec![Msg::UseCookiesToggled(true)],
        ("cookies", "off") => vec![Msg::UseCookiesToggled(false)],
        _ => return Input::Unknown(line.to_string()),
    };
    Input::Dispatch(msgs)
}

/// Messages replayed at startup: begin polling, then apply the command
/// line's form choices.
pub fn startup_msgs(args: &WatchArgs) -> Vec<Msg> {
    let mut msgs = vec![Msg::AppStarted];
    if let Some(preset) = &args.preset {
        msgs.push(Msg::PresetSelected(preset.clone()));
    }
    if args.cookies {
        msgs.push(Msg::UseCookiesToggled(true));
    }
    if let Some(url) = &args.url {
        msgs.push(Msg::UrlInputChanged(url.clone()));
        msgs.push(Msg::SubmitClicked);
    }
    if let Some(job_id) = &args.track {
        msgs.push(Msg::TrackJob(job_id.clone()));
    }
    msgs
}

/// Whether the session has nothing left to wait for, and how it ended.
pub fn settled(msg: &Msg, state: &AppState) -> Option<bool> {
    match msg {
        Msg::JobSubmitted(Err(_)) => return Some(false),
        Msg::JobSubmitted(Ok(SubmitOutcome::Batch { .. })) => return Some(true),
        _ => {}
    }
    match state.tracker().phase() {
        TrackerPhase::Done => Some(true),
        TrackerPhase::Failed => Some(false),
        _ => None,
    }
}

/// Owns the state and drives `update`, effects and rendering.
pub struct Session<S> {
    state: AppState,
    runner: EffectRunner<S>,
    renderer: TextRenderer,
}

impl<S: Scheduler> Session<S> {
    pub fn new(state: AppState, runner: EffectRunner<S>) -> Self {
        Self {
            state,
            runner,
            renderer: TextRenderer::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Renders the current view regardless of the dirty flag.
    pub fn render_now(&mut self) -> Vec<String> {
        self.state.consume_dirty();
        self.renderer.render(&self.state.view())
    }

    /// Applies `msg` and returns the lines to print.
    pub fn dispatch(&mut self, msg: Msg) -> Vec<String> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let lines = if state.consume_dirty() {
            self.renderer.render(&state.view())
        } else {
            Vec::new()
        };
        self.state = state;
        lines
    }
}

fn print(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Reads stdin on a plain thread; the process exits without joining it.
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(parse_input(&line)).is_err() {
                break;
            }
        }
    });
}

/// Runs the interactive watcher until `:quit`, Ctrl-C, or (with
/// `--exit-when-done`) until the tracked job settles. Returns whether the
/// session ended well.
pub async fn run_watch(
    config: AppConfig,
    api: Arc<dyn DownloaderApi>,
    args: WatchArgs,
) -> anyhow::Result<bool> {
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(api, TokioScheduler::new(msg_tx.clone()), msg_tx);
    let mut session = Session::new(
        AppState::with_config(config.defaults, config.intervals),
        runner,
    );
    let mut stdout = io::stdout();

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(input_tx);
    let mut stdin_open = true;

    print(&mut stdout, &session.render_now()).context("writing to stdout")?;
    for msg in startup_msgs(&args) {
        let lines = session.dispatch(msg);
        print(&mut stdout, &lines).context("writing to stdout")?;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(msg) = msg_rx.recv() => {
                let received = msg.clone();
                let lines = session.dispatch(msg);
                print(&mut stdout, &lines).context("writing to stdout")?;
                if args.exit_when_done {
                    if let Some(ok) = settled(&received, session.state()) {
                        watch_info!("Session settled, success={}", ok);
                        return Ok(ok);
                    }
                }
            }
            input = input_rx.recv(), if stdin_open => match input {
                Some(Input::Dispatch(msgs)) => {
                    for msg in msgs {
                        let lines = session.dispatch(msg);
                        print(&mut stdout, &lines).context("writing to stdout")?;
                    }
                }
                Some(Input::Help) => print(&mut stdout, &[HELP.to_string()])?,
                Some(Input::Unknown(line)) => {
                    print(&mut stdout, &[format!("unknown command {line:?}, try :help")])?
                }
                Some(Input::Empty) => {}
                Some(Input::Quit) => return Ok(true),
                None => {
                    watch_debug!("stdin closed");
                    stdin_open = false;
                }
            },
            result = &mut ctrl_c => {
                result.context("listening for Ctrl-C")?;
                watch_info!("Interrupted");
                return Ok(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlwatch_core::TimerKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_line_submits_it() {
        assert_eq!(
            parse_input("  http://x/video \n"),
            Input::Dispatch(vec![
                Msg::UrlInputChanged("http://x/video".into()),
                Msg::SubmitClicked
            ])
        );
    }

    #[test]
    fn commands_map_to_messages() {
        assert_eq!(parse_input(":stop"), Input::Dispatch(vec![Msg::StopTrackingClicked]));
        assert_eq!(
            parse_input(":preset Audio (MP3 Best)"),
            Input::Dispatch(vec![Msg::PresetSelected("Audio (MP3 Best)".into())])
        );
        assert_eq!(
            parse_input(":cookies on"),
            Input::Dispatch(vec![Msg::UseCookiesToggled(true)])
        );
        assert_eq!(
            parse_input(":track j9"),
            Input::Dispatch(vec![Msg::TrackJob("j9".into())])
        );
        assert_eq!(parse_input(":q"), Input::Quit);
        assert_eq!(parse_input(""), Input::Empty);
    }

    #[test]
    fn malformed_commands_are_unknown() {
        assert_eq!(parse_input(":track"), Input::Unknown(":track".into()));
        assert_eq!(parse_input(":cookies maybe"), Input::Unknown(":cookies maybe".into()));
        assert_eq!(parse_input(":nope"), Input::Unknown(":nope".into()));
    }

    #[test]
    fn startup_applies_form_choices_before_submitting() {
        let args = WatchArgs {
            url: Some("http://x/video".into()),
            preset: Some("Audio (MP3 Best)".into()),
            cookies: true,
            ..WatchArgs::default()
        };
        assert_eq!(
            startup_msgs(&args),
            vec![
                Msg::AppStarted,
                Msg::PresetSelected("Audio (MP3 Best)".into()),
                Msg::UseCookiesToggled(true),
                Msg::UrlInputChanged("http://x/video".into()),
                Msg::SubmitClicked,
            ]
        );
    }

    #[test]
    fn settled_on_rejection_batch_or_terminal_job() {
        let state = AppState::new();
        assert_eq!(settled(&Msg::JobSubmitted(Err("bad".into())), &state), Some(false));
        assert_eq!(
            settled(&Msg::JobSubmitted(Ok(SubmitOutcome::Batch { count: 2 })), &state),
            Some(true)
        );
        assert_eq!(settled(&Msg::RefreshFilesClicked, &state), None);

        let (state, _) = update(state, Msg::TrackJob("j1".into()));
        let epoch = state.tracker().epoch();
        let (state, _) = update(
            state,
            Msg::StatusFetched {
                epoch,
                result: Err("connection refused".into()),
            },
        );
        assert_eq!(settled(&Msg::Tick(TimerKind::JobStatus), &state), Some(false));
    }
}
