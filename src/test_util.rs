use std::thread;
use std::time::{Duration, Instant};

/// How long a thread holds a lock in the timing tests.
pub const STEP: Duration = Duration::from_millis(500);

/// Slack allowed around `STEP` for scheduling noise.
pub const TOLERANCE: Duration = Duration::from_millis(100);

pub fn trace_init() -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_timer(())
        .set_default()
}

/// Spins (yielding) until `f` holds, failing the test after ten seconds.
pub fn wait_for(mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while !f() {
        assert!(start.elapsed() < Duration::from_secs(10), "condition never became true");
        thread::yield_now();
    }
}
