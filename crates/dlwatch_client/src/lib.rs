//! dlwatch client: HTTP collaborator, timers, and effect execution.
mod api;
mod artifact;
mod runner;
mod schedule;
mod types;

pub use api::{ApiSettings, DownloaderApi, ReqwestApi};
pub use artifact::{ensure_output_dir, DownloadError};
pub use runner::EffectRunner;
pub use schedule::{ManualScheduler, Scheduler, TokioScheduler};
pub use types::{FailureKind, TransportError};
