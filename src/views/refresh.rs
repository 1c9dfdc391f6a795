use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// A running auto-refresh timer. Dropping the handle stops it.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Call `tick` every `period`, first call one period from now. A tick that
/// overruns delays the next one instead of bunching calls up.
pub fn spawn_auto_refresh<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let task = tokio::spawn(async move {
        let mut ticks = IntervalStream::new(interval);
        while ticks.next().await.is_some() {
            debug!("{} auto-refresh", name);
            tick().await;
        }
    });

    RefreshHandle { task }
}
