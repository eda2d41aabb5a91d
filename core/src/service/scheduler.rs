use crate::prelude::{TrackError, TrackResult};
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cloneable view of the host's shutdown flag.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested, including requests made
    /// before this call.
    pub async fn wait(&mut self) {
        // a closed channel means the host is gone, which counts as shutdown
        let _ = self.rx.wait_for(|raised| *raised).await;
    }
}

/// Runs one invocation on its own task so a panic surfaces as an error
/// instead of ending the service loop.
async fn invoke<Fut>(invocation: Fut) -> TrackResult<()>
where
    Fut: Future<Output = TrackResult<()>> + Send + 'static,
{
    tokio::spawn(invocation)
        .await
        .unwrap_or_else(|err| Err(TrackError::Service(format!("routine aborted: {}", err))))
}

struct ServiceTask {
    name: String,
    handle: JoinHandle<()>,
}

/// Hosts named background routines on the tokio runtime until shutdown.
pub struct ServiceHost {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<ServiceTask>,
    failures: Arc<AtomicUsize>,
}

impl ServiceHost {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            tasks: Vec::new(),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_tx.subscribe(),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of routine invocations that returned an error so far.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Spawns `routine` without blocking the caller. Must be called from
    /// within a tokio runtime.
    ///
    /// Without a period the routine runs once. With a period the service
    /// waits up to `period` for shutdown, runs the routine if the wait timed
    /// out, and repeats; shutdown during the wait ends the loop without
    /// another invocation. Errors and panics are logged and counted and do
    /// not stop the service.
    pub fn run_service<F, Fut>(
        &mut self,
        name: impl Into<String>,
        period: Option<Duration>,
        mut routine: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TrackResult<()>> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let mut signal = self.shutdown_signal();
        let failures = Arc::clone(&self.failures);

        let handle = tokio::spawn(async move {
            let report = |result: TrackResult<()>| {
                if let Err(err) = result {
                    failures.fetch_add(1, Ordering::SeqCst);
                    error!("service {} routine failed: {}", task_name, err);
                }
            };

            match period {
                None => report(invoke(routine()).await),
                Some(period) => loop {
                    if tokio::time::timeout(period, signal.wait()).await.is_ok() {
                        break;
                    }
                    report(invoke(routine()).await);
                },
            }
            debug!("service {} finished", task_name);
        });

        info!("registered service {} (period {:?})", name, period);
        self.tasks.push(ServiceTask { name, handle });
    }

    /// Raises the shutdown signal and waits for every service, in
    /// registration order. In-flight routines are allowed to complete.
    pub async fn shutdown(&mut self) -> TrackResult<()> {
        self.shutdown_tx.send_replace(true);

        let mut aborted = Vec::new();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.handle.await {
                warn!("service {} terminated abnormally: {}", task.name, err);
                aborted.push(task.name);
            }
        }

        if aborted.is_empty() {
            info!("all services stopped");
            Ok(())
        } else {
            Err(TrackError::Service(format!(
                "services terminated abnormally: {}",
                aborted.join(", ")
            )))
        }
    }
}

impl Default for ServiceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ServiceHost {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}
