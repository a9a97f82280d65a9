use std::future::Future;
use std::sync::Arc;

use dlwatch_core::{Effect, Msg};
use tokio::sync::mpsc;
use watch_logging::watch_trace;

use crate::{DownloaderApi, Scheduler};

/// Executes effects: timers go to the scheduler, requests run as tokio
/// tasks whose results come back through the message channel.
///
/// Each tracker allows one outstanding request, so spawned requests never
/// race each other for the same state slot.
pub struct EffectRunner<S> {
    api: Arc<dyn DownloaderApi>,
    scheduler: S,
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl<S: Scheduler> EffectRunner<S> {
    pub fn new(api: Arc<dyn DownloaderApi>, scheduler: S, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            api,
            scheduler,
            msg_tx,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            watch_trace!("Effect {:?}", effect);
            match effect {
                Effect::StartTimer { timer, interval } => self.scheduler.start(timer, interval),
                Effect::CancelTimer { timer } => self.scheduler.cancel(timer),
                Effect::SubmitJob(submission) => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        let result = api.start_job(&submission).await;
                        Msg::JobSubmitted(result.map_err(|err| err.to_string()))
                    });
                }
                Effect::FetchStatus(poll) => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        let result = api.fetch_status(&poll.job_id, poll.after).await;
                        Msg::StatusFetched {
                            epoch: poll.epoch,
                            result: result.map_err(|err| err.to_string()),
                        }
                    });
                }
                Effect::FetchTasks { epoch } => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        let result = api.fetch_tasks().await;
                        Msg::TasksFetched {
                            epoch,
                            result: result.map_err(|err| err.to_string()),
                        }
                    });
                }
                Effect::FetchFiles => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        let result = api.fetch_files().await;
                        Msg::FilesFetched(result.map_err(|err| err.to_string()))
                    });
                }
            }
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            // The loop may already be gone at shutdown.
            let _ = tx.send(request.await);
        });
    }
}
