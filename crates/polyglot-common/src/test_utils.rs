//! Test utilities shared by the workspace crates.
//!
//! Enabled for other crates through the `testing` feature.

use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
///
/// Returns whether the condition was observed to hold.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_until_observes_condition() {
        let calls = AtomicUsize::new(0);
        let seen = wait_until(Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst) >= 2
        });
        assert!(seen);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(30), || false));
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }
}
