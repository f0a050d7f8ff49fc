//! Stop flag shared by the freeze loop and the CLI's stop keys.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// One-shot stop flag with an interruptible wait.
///
/// The freeze loop sleeps between writes through [`wait`](Self::wait), so a
/// stop request ends the sleep at once instead of after a full interval.
pub struct ShutdownSignal {
    shutdown: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Request a stop and wake every waiter. Cannot be undone.
    pub fn trigger(&self) {
        let _guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
        self.shutdown.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleep up to `duration`. Returns `true` when a stop was requested.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }

        let guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_shutdown())
        {
            Ok((_, timeout_result)) => !timeout_result.timed_out(),
            // Mutex poisoned, treat as shutdown
            Err(_) => true,
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());
    }

    #[test]
    fn test_wait_timeout() {
        let signal = ShutdownSignal::new();
        let start = Instant::now();
        let interrupted = signal.wait(Duration::from_millis(50));
        let elapsed = start.elapsed();

        assert!(!interrupted);
        assert!(elapsed >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_interrupted() {
        let signal = Arc::new(ShutdownSignal::new());
        let signal_clone = Arc::clone(&signal);

        let handle = thread::spawn(move || {
            let start = Instant::now();
            let interrupted = signal_clone.wait(Duration::from_secs(10));
            (interrupted, start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        signal.trigger();

        let (interrupted, elapsed) = handle.join().unwrap();
        assert!(interrupted);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_trigger_wakes_every_waiter() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = Arc::clone(&signal);
                thread::spawn(move || signal.wait(Duration::from_secs(10)))
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        signal.trigger();
        signal.trigger();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_wait_already_shutdown() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let start = Instant::now();
        assert!(signal.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
