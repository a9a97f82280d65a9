use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "dlwatch",
    version,
    about = "Submit downloads to a media-download server and watch them progress",
    propagate_version = true
)]
pub struct Cli {
    /// Server base URL (falls back to the config file, then DLWATCH_SERVER).
    #[arg(short = 's', long = "server", global = true)]
    pub server: Option<String>,

    /// TOML configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Status poll period for the tracked job, in milliseconds.
    #[arg(long = "status-interval-ms", global = true)]
    pub status_interval_ms: Option<u64>,

    /// Task list poll period, in milliseconds.
    #[arg(long = "tasks-interval-ms", global = true)]
    pub tasks_interval_ms: Option<u64>,

    /// Where log records go.
    #[arg(long = "log", value_enum, default_value_t = LogTarget::File, global = true)]
    pub log: LogTarget,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long = "log-level", default_value = "info", global = true)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive watcher: paste URLs on stdin, see progress, tasks and files.
    Watch(WatchArgs),
    /// Print the server's download directory listing once.
    Files,
    /// Download a finished artifact into a local directory.
    Fetch {
        /// File name as listed by `files`.
        name: String,

        /// Destination directory.
        #[arg(short = 'd', long = "dest", default_value = ".")]
        dest: PathBuf,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct WatchArgs {
    /// Submit this URL right after startup.
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Format preset for submissions.
    #[arg(short = 'p', long = "preset")]
    pub preset: Option<String>,

    /// Ask the server to use its mounted cookies file.
    #[arg(long = "cookies")]
    pub cookies: bool,

    /// Follow an already running job instead of submitting one.
    #[arg(short = 't', long = "track", conflicts_with = "url")]
    pub track: Option<String>,

    /// Quit once the tracked job is done or failed.
    #[arg(long = "exit-when-done")]
    pub exit_when_done: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            status_interval_ms: self.status_interval_ms,
            tasks_interval_ms: self.tasks_interval_ms,
        }
    }

    /// The subcommand to run; no subcommand means `watch` with no options.
    pub fn command(&self) -> Command {
        match &self.command {
            Some(Command::Watch(args)) => Command::Watch(args.clone()),
            Some(Command::Files) => Command::Files,
            Some(Command::Fetch { name, dest }) => Command::Fetch {
                name: name.clone(),
                dest: dest.clone(),
            },
            None => Command::Watch(WatchArgs::default()),
        }
    }
}
