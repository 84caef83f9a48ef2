//! Cancellable fixed-interval task.
//!
//! The body runs to completion before the next tick is awaited, so passes
//! never overlap. `stop` waits for the loop to exit; once it returns no
//! further pass starts. Dropping the handle aborts the loop.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

pub struct PeriodicTask {
    name: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawns `body` every `period`, first pass immediately.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut body: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            info!("⏱️  [{}] started (every {:?})", name, period);
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut rx => break,
                    _ = ticker.tick() => body().await,
                }
            }
            debug!("[{}] loop exited", name);
        });

        Self {
            name,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the loop and waits for it to finish its current pass.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("⏹️  [{}] stopped", self.name);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
