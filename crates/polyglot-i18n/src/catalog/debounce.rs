//! Quiet-window debouncer backed by a dedicated thread

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::trace;

/// Runs an action once no poke has arrived for a full quiet window.
///
/// Each poke restarts the window, so a burst of pokes yields one run. Dropping
/// the debouncer runs the action one last time if a window is open.
pub struct Debouncer {
    tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Start the worker thread
    pub fn spawn<F>(name: impl Into<String>, window: Duration, action: F) -> io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            // Idle until the first poke of a burst.
            while rx.recv().is_ok() {
                loop {
                    match rx.recv_timeout(window) {
                        Ok(()) => continue,
                        Err(RecvTimeoutError::Timeout) => {
                            trace!("debounce window elapsed");
                            action();
                            break;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            action();
                            return;
                        }
                    }
                }
            }
        })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Open or extend the quiet window
    pub fn poke(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(());
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            // The worker can end up dropping its own owner; it must not join itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(window: Duration) -> (Debouncer, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let debouncer = Debouncer::spawn("test-debounce", window, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (debouncer, runs)
    }

    #[test]
    fn test_burst_runs_once() {
        let (debouncer, runs) = counting(Duration::from_millis(50));
        for _ in 0..20 {
            debouncer.poke();
        }
        thread::sleep(Duration::from_millis(300));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_separate_bursts_run_separately() {
        let (debouncer, runs) = counting(Duration::from_millis(30));
        debouncer.poke();
        thread::sleep(Duration::from_millis(250));
        debouncer.poke();
        thread::sleep(Duration::from_millis(250));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_runs_open_window() {
        let (debouncer, runs) = counting(Duration::from_secs(60));
        debouncer.poke();
        drop(debouncer);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_without_poke_does_nothing() {
        let (debouncer, runs) = counting(Duration::from_millis(10));
        drop(debouncer);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
