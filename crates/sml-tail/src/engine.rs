//! The per-file tail engine.
//!
//! One [`TailEngine`] owns one growing log file: a filesystem watch, a byte
//! cursor positioned at the end of the file at open time, and an event loop
//! that turns write notifications into parsed [`Record`]s. The engine is a
//! small state machine:
//!
//! ```text
//! open() ──► WATCHING ──► READING ──► WATCHING ──► … ──► DONE | FAILED
//! ```
//!
//! `WATCHING` blocks on the internal event channel; `READING` is entered on
//! a write notification and consumes every byte between the cursor and the
//! current end of file. [`TailHandle::stop`] injects a synthetic stop event
//! into the same channel the filesystem events arrive on, so a stop request
//! never races a concurrent read cycle. File removal, a watch failure, and
//! an unrecoverable read error terminate the engine as failed; none of them
//! may affect any other file's engine.

use std::io::SeekFrom;
use std::path::PathBuf;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sml_core::parse::parse_line;
use sml_core::queue::QueueSender;
use sml_core::types::{FileCursor, LineCounters, Record, TimestampLayout};

use crate::assembler::LineAssembler;

/// Why a tail engine could not be constructed or why it terminated as failed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The file could not be opened or stat'ed at construction time.
    #[error("cannot open {}: {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The filesystem watch could not be registered at construction time.
    #[error("cannot watch {}: {source}", .path.display())]
    WatchSetupFailed {
        path: PathBuf,
        source: notify::Error,
    },
    /// The watched file was removed out from under the engine.
    #[error("file removed")]
    FileRemoved,
    /// The filesystem watch itself reported an error.
    #[error("filesystem watch failed: {0}")]
    WatchError(notify::Error),
    /// Reading newly appended bytes failed.
    #[error("read failed: {0}")]
    Read(std::io::Error),
    /// The shared record queue was closed while this engine was still
    /// running. The orchestrator's shutdown ordering makes this unreachable;
    /// seeing it means the ordering invariant was broken.
    #[error("record queue closed while the engine was still running")]
    QueueClosed,
}

/// Everything the engine's event loop reacts to. Filesystem notifications
/// and the synthetic stop request share one channel, so whichever terminal
/// event arrives first wins.
#[derive(Debug)]
enum TailEvent {
    Wrote,
    Removed,
    WatchFailed(notify::Error),
    Stop,
}

/// Cloneable handle for requesting graceful termination of one engine.
#[derive(Clone)]
pub struct TailHandle {
    events: mpsc::UnboundedSender<TailEvent>,
}

impl TailHandle {
    /// Ask the engine to finish its current cycle and terminate as done.
    /// Idempotent and thread-safe: once the engine has terminated, the
    /// underlying channel is closed and further calls are no-ops.
    pub fn stop(&self) {
        let _ = self.events.send(TailEvent::Stop);
    }
}

/// A tail engine bound to a single file. See the module docs for the state
/// machine; [`TailEngine::run`] drives it to a terminal state.
pub struct TailEngine {
    cursor: FileCursor,
    counters: LineCounters,
    assembler: LineAssembler,
    events: mpsc::UnboundedReceiver<TailEvent>,
    handle: TailHandle,
    // Keeps the watch registered for the lifetime of the engine; dropped
    // (and thereby released) exactly once, when `run` returns.
    _watcher: RecommendedWatcher,
    debug: bool,
}

impl std::fmt::Debug for TailEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailEngine")
            .field("cursor", &self.cursor)
            .field("counters", &self.counters)
            .field("assembler", &self.assembler)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl TailEngine {
    /// Open `path` and register a filesystem watch on it. The cursor starts
    /// at the current end of file, so only lines appended afterwards are
    /// delivered.
    pub fn open(
        path: impl Into<PathBuf>,
        layout: TimestampLayout,
    ) -> Result<Self, EngineError> {
        let path = path.into();
        let meta = std::fs::metadata(&path).map_err(|source| EngineError::FileUnavailable {
            path: path.clone(),
            source,
        })?;
        let mut cursor = FileCursor::new(path, layout);
        cursor.offset = meta.len();

        let (tx, rx) = mpsc::unbounded_channel();
        let watch_tx = tx.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => match event.kind {
                        EventKind::Modify(_) => TailEvent::Wrote,
                        EventKind::Remove(_) => TailEvent::Removed,
                        _ => return,
                    },
                    Err(err) => TailEvent::WatchFailed(err),
                };
                let _ = watch_tx.send(event);
            })
            .map_err(|source| EngineError::WatchSetupFailed {
                path: cursor.path.clone(),
                source,
            })?;
        watcher
            .watch(&cursor.path, RecursiveMode::NonRecursive)
            .map_err(|source| EngineError::WatchSetupFailed {
                path: cursor.path.clone(),
                source,
            })?;

        Ok(Self {
            cursor,
            counters: LineCounters::default(),
            assembler: LineAssembler::new(),
            events: rx,
            handle: TailHandle { events: tx },
            _watcher: watcher,
            debug: false,
        })
    }

    /// A handle for stopping this engine from another task.
    pub fn handle(&self) -> TailHandle {
        self.handle.clone()
    }

    /// Toggle verbose per-line logging. Has no effect on what is delivered.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    /// Drive the engine to a terminal state, pushing each parsed record into
    /// `records`. Returns the line counters on a graceful stop and the
    /// terminal error otherwise. Consumes the engine: the watch and the
    /// internal event channel are released exactly once, when this returns.
    pub async fn run(mut self, records: QueueSender<Record>) -> Result<LineCounters, EngineError> {
        info!(
            file = %self.cursor.name,
            offset = self.cursor.offset,
            "tailing"
        );
        let outcome = self.event_loop(&records).await;
        match &outcome {
            Ok(counters) => info!(
                file = %self.cursor.name,
                parsed = counters.parsed,
                malformed = counters.malformed,
                "engine stopped"
            ),
            Err(err) => warn!(
                file = %self.cursor.name,
                parsed = self.counters.parsed,
                malformed = self.counters.malformed,
                error = %err,
                "engine failed"
            ),
        }
        outcome
    }

    async fn event_loop(
        &mut self,
        records: &QueueSender<Record>,
    ) -> Result<LineCounters, EngineError> {
        loop {
            match self.events.recv().await {
                Some(TailEvent::Wrote) => self.read_cycle(records).await?,
                Some(TailEvent::Removed) => return Err(EngineError::FileRemoved),
                Some(TailEvent::WatchFailed(err)) => return Err(EngineError::WatchError(err)),
                Some(TailEvent::Stop) => return Ok(self.counters),
                // Unreachable: the engine's own handle keeps the channel
                // open. A vanished channel reads as a stop.
                None => return Ok(self.counters),
            }
        }
    }

    /// One read cycle: consume every byte between the cursor and the current
    /// end of file. Idempotent and resumable — coalesced write notifications
    /// simply find nothing new to read.
    async fn read_cycle(&mut self, records: &QueueSender<Record>) -> Result<(), EngineError> {
        let file = match fs::File::open(&self.cursor.path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::FileRemoved)
            }
            Err(err) => return Err(EngineError::Read(err)),
        };
        let size = file.metadata().await.map_err(EngineError::Read)?.len();

        if size < self.cursor.offset {
            // Truncation is a normal rotation pattern, not a failure. The
            // buffered partial line belongs to content that no longer exists.
            debug!(
                file = %self.cursor.name,
                offset = self.cursor.offset,
                size,
                "file truncated; resetting cursor"
            );
            self.cursor.offset = size;
            self.assembler.reset();
            return Ok(());
        }
        if size == self.cursor.offset {
            return Ok(());
        }

        let mut file = file;
        file.seek(SeekFrom::Start(self.cursor.offset))
            .await
            .map_err(EngineError::Read)?;
        let mut chunk = Vec::with_capacity((size - self.cursor.offset) as usize);
        file.take(size - self.cursor.offset)
            .read_to_end(&mut chunk)
            .await
            .map_err(EngineError::Read)?;

        let lines = self.assembler.push(&chunk);
        let read_lines = lines.len();
        for line in lines {
            self.handle_line(&line, records).await?;
        }
        self.cursor.offset += chunk.len() as u64;

        if self.debug {
            debug!(
                file = %self.cursor.name,
                lines = read_lines,
                offset = self.cursor.offset,
                "read cycle"
            );
        }
        Ok(())
    }

    async fn handle_line(
        &mut self,
        line: &str,
        records: &QueueSender<Record>,
    ) -> Result<(), EngineError> {
        match parse_line(line, &self.cursor.path, self.cursor.layout) {
            Ok(record) => {
                if self.debug {
                    debug!(file = %self.cursor.name, message = %record.message, "line parsed");
                }
                records
                    .send(record)
                    .await
                    .map_err(|_| EngineError::QueueClosed)?;
                self.counters.parsed += 1;
            }
            Err(err) => {
                self.counters.malformed += 1;
                if self.debug {
                    debug!(file = %self.cursor.name, error = %err, "line dropped");
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
