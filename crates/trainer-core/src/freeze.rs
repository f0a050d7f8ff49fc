//! Background loop that keeps one address pinned to a fixed byte pattern.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::memory::MemorySession;
use crate::shutdown::ShutdownSignal;

#[derive(Debug, Default)]
struct FreezeStats {
    writes: AtomicU64,
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// A running freeze on a single address.
///
/// The pattern is captured at start and never changes; restart the worker to
/// freeze a different value. Dropping the worker stops it.
pub struct FreezeWorker {
    target: u64,
    pattern: Vec<u8>,
    signal: Arc<ShutdownSignal>,
    stats: Arc<FreezeStats>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl FreezeWorker {
    /// Spawn the loop: write `pattern` to `target` every `interval` until stopped.
    ///
    /// Failed writes are recorded and the loop keeps going, so the freeze
    /// resumes on its own once the address becomes writable again.
    pub fn start(
        session: Arc<MemorySession>,
        target: u64,
        pattern: Vec<u8>,
        interval: Duration,
    ) -> Result<Self> {
        let signal = Arc::new(ShutdownSignal::new());
        let stats = Arc::new(FreezeStats::default());
        let (done_tx, done) = mpsc::channel();

        let handle = {
            let signal = Arc::clone(&signal);
            let stats = Arc::clone(&stats);
            let pattern = pattern.clone();
            thread::Builder::new()
                .name("freeze".to_string())
                .spawn(move || {
                    debug!("Freeze loop started at {:#x}", target);
                    let mut failing = false;

                    while !signal.is_shutdown() {
                        match session.write_bytes(target, &pattern) {
                            Ok(()) => {
                                if failing {
                                    info!("Freeze writes at {:#x} resumed", target);
                                    failing = false;
                                }
                                stats.writes.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                if !failing {
                                    warn!("Freeze write at {:#x} failed: {}", target, e);
                                    failing = true;
                                }
                                stats.failures.fetch_add(1, Ordering::Relaxed);
                                *stats
                                    .last_error
                                    .lock()
                                    .unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
                            }
                        }

                        if signal.wait(interval) {
                            break;
                        }
                    }

                    debug!("Freeze loop at {:#x} stopped", target);
                    let _ = done_tx.send(());
                })?
        };

        info!(
            "Freezing {:#x} to {:02X?} every {}ms",
            target,
            pattern,
            interval.as_millis()
        );

        Ok(Self {
            target,
            pattern,
            signal,
            stats,
            done,
            handle: Some(handle),
        })
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Whether the loop thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Successful writes so far
    pub fn writes(&self) -> u64 {
        self.stats.writes.load(Ordering::Relaxed)
    }

    /// Failed writes so far
    pub fn failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }

    /// Most recent write error, if any write ever failed
    pub fn last_error(&self) -> Option<String> {
        self.stats
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Signal cancellation and wait up to `timeout` for the loop to exit.
    ///
    /// Returns `true` if the loop exited and was joined. Otherwise the thread
    /// is abandoned; it exits on its own after its current write.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.shutdown(timeout)
    }

    fn shutdown(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };

        self.signal.trigger();
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("Freeze loop at {:#x} panicked", self.target);
                }
                debug!(
                    "Freeze at {:#x} stopped after {} writes ({} failed)",
                    self.target,
                    self.writes(),
                    self.failures()
                );
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Freeze loop at {:#x} did not stop within {}ms, abandoning it",
                    self.target,
                    timeout.as_millis()
                );
                false
            }
        }
    }
}

impl Drop for FreezeWorker {
    fn drop(&mut self) {
        self.shutdown(crate::memory::layout::timing::FREEZE_STOP_TIMEOUT);
    }
}
