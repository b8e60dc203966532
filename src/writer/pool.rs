use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use futures::future;
use futures::FutureExt;
use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// Fixed-size pool of upload workers draining a shared task queue.
///
/// The pool size never depends on the number of tasks; extra tasks wait in the
/// queue until a worker is free. After the first failure workers stop taking
/// new tasks, in-flight tasks run to completion, and the first failure is
/// returned.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            bail!("Upload worker pool needs at least one worker");
        }
        Ok(WorkerPool { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `handler` once per task and wait for every worker to exit.
    ///
    /// A task that panics is reported as a crashed worker and stops the pool
    /// the same way a failed task does.
    pub async fn run<T, F, Fut>(&self, tasks: Vec<T>, handler: F) -> Result<()>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let runtime = Handle::try_current().context("Failed to start upload worker pool")?;

        debug!("Dispatching {} tasks to {} upload workers", tasks.len(), self.size);

        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let failed = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(handler);

        let workers: Vec<_> = (0..self.size)
            .map(|worker_id| {
                runtime.spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&failed),
                    Arc::clone(&handler),
                ))
            })
            .collect();

        let mut first_fault = None;
        for (worker_id, outcome) in future::join_all(workers).await.into_iter().enumerate() {
            let fault = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(join_error) => anyhow!("Upload worker {} crashed: {}", worker_id, join_error),
            };
            warn!("{:#}", fault);
            first_fault.get_or_insert(fault);
        }

        match first_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

async fn worker_loop<T, F, Fut>(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<T>>>,
    failed: Arc<AtomicBool>,
    handler: Arc<F>,
) -> Result<()>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    loop {
        if failed.load(Ordering::SeqCst) {
            return Ok(());
        }

        let Some(task) = queue.lock().await.pop_front() else {
            return Ok(());
        };

        match AssertUnwindSafe((*handler)(task)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failed.store(true, Ordering::SeqCst);
                return Err(e.context(format!("Upload worker {} failed", worker_id)));
            }
            Err(panic) => {
                failed.store(true, Ordering::SeqCst);
                return Err(anyhow!(
                    "Upload worker {} crashed: {}",
                    worker_id,
                    panic_message(panic.as_ref())
                ));
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
