//! The orchestrator — wires tail engines, the shared queue, and the worker
//! pool together, and owns the shutdown ordering.
//!
//! Lifecycle invariant: the worker pool starts before any engine runs, and
//! the queue is closed only after *every* engine task has been joined. A
//! closed-queue push from a live engine is therefore impossible by
//! construction, and workers always observe a cleanly closed, fully drained
//! queue.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sml_core::queue;
use sml_core::{Config, Record};
use sml_sink::{Sink, WorkerPool};
use sml_tail::{TailEngine, TailHandle};

/// What happened to the engine fleet, reported when the pipeline drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Engines that terminated gracefully.
    pub stopped: usize,
    /// Engines that terminated as failed (file removed, watch error, …).
    pub failed: usize,
    /// Paths skipped because no engine could be constructed for them.
    pub skipped: usize,
}

/// Runs the whole pipeline for one list of input paths.
pub struct Orchestrator {
    config: Config,
    sink: Arc<dyn Sink>,
}

impl Orchestrator {
    /// Every knob comes in through `config`; the orchestrator never reads
    /// flags or the environment itself.
    pub fn new(config: Config, sink: Arc<dyn Sink>) -> Self {
        Self { config, sink }
    }

    /// Start the worker pool, then one tail engine per newline-delimited
    /// path read from `paths` (a path that cannot be opened is logged and
    /// skipped). Block until every engine reaches a terminal state, close
    /// the queue, and block until the pool has drained it. Cancelling
    /// `shutdown` stops path intake and requests a graceful stop from every
    /// running engine.
    pub async fn run(
        self,
        paths: impl AsyncBufRead + Unpin,
        shutdown: CancellationToken,
    ) -> RunSummary {
        let capacity = self.config.pipeline.effective_queue_capacity();
        let (records, drain) = queue::bounded::<Record>(capacity);
        let pool = WorkerPool::spawn(
            Arc::clone(&self.sink),
            drain,
            self.config.pipeline.workers,
        );

        let mut summary = RunSummary::default();
        let mut engines = JoinSet::new();
        let mut handles: Vec<TailHandle> = Vec::new();

        let mut lines = paths.lines();
        loop {
            let maybe_line = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                line = lines.next_line() => match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "failed to read the path list; no further engines");
                        None
                    }
                },
            };
            let Some(raw) = maybe_line else { break };
            let path = raw.trim();
            if path.is_empty() {
                continue;
            }

            match TailEngine::open(path, self.config.tail.layout) {
                Ok(mut engine) => {
                    engine.set_debug(self.config.tail.debug);
                    handles.push(engine.handle());
                    engines.spawn(engine.run(records.clone()));
                }
                Err(err) => {
                    warn!(path, error = %err, "skipping file");
                    summary.skipped += 1;
                }
            }
        }
        info!(engines = engines.len(), skipped = summary.skipped, "path list exhausted");

        // Fan the shutdown signal out as a stop request on each engine's own
        // event path.
        let stop_fanout = tokio::spawn({
            let shutdown = shutdown.clone();
            let handles = handles.clone();
            async move {
                shutdown.cancelled().await;
                for handle in &handles {
                    handle.stop();
                }
            }
        });

        while let Some(joined) = engines.join_next().await {
            match joined {
                Ok(Ok(_counters)) => summary.stopped += 1,
                // The engine logged its own failure before returning.
                Ok(Err(_)) => summary.failed += 1,
                Err(err) => {
                    error!(error = %err, "engine task aborted");
                    summary.failed += 1;
                }
            }
        }
        stop_fanout.abort();

        // Every engine is terminal; dropping the last sender closes the
        // queue, and the workers drain whatever is still buffered.
        drop(records);
        pool.join().await;

        info!(
            stopped = summary.stopped,
            failed = summary.failed,
            skipped = summary.skipped,
            "pipeline drained"
        );
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sml_sink::SinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Default)]
    struct NullSink {
        inserted: AtomicUsize,
    }

    #[async_trait]
    impl Sink for NullSink {
        async fn insert(&self, _record: Record) -> Result<(), SinkError> {
            self.inserted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn empty_path_list_drains_cleanly() {
        let orchestrator = Orchestrator::new(Config::defaults(), Arc::new(NullSink::default()));
        let summary = timeout(
            Duration::from_secs(5),
            orchestrator.run(&b""[..], CancellationToken::new()),
        )
        .await
        .unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn unopenable_paths_are_skipped_not_fatal() {
        let orchestrator = Orchestrator::new(Config::defaults(), Arc::new(NullSink::default()));
        let input = b"/nonexistent/a.log\n\n/nonexistent/b.log\n";
        let summary = timeout(
            Duration::from_secs(5),
            orchestrator.run(&input[..], CancellationToken::new()),
        )
        .await
        .unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.stopped, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn shutdown_stops_running_engines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, "").unwrap();

        let sink = Arc::new(NullSink::default());
        let orchestrator = Orchestrator::new(Config::defaults(), sink.clone());
        let input = format!("{}\n", path.display()).into_bytes();
        let shutdown = CancellationToken::new();

        let run = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { orchestrator.run(&input[..], shutdown).await }
        });

        // Give the engine time to start; it would otherwise watch forever,
        // so cancelling must drain the pipeline.
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();
        let summary = timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
        assert_eq!(summary.stopped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(sink.inserted.load(Ordering::SeqCst), 0);
    }
}
