//! Trailing-edge debounce timer.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

type Action = Box<dyn Fn() + Send + 'static>;

struct Shared {
    state: Mutex<TimerState>,
    signal: Condvar,
}

#[derive(Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

/// Runs an action once the triggers stop for `delay`.
///
/// Every [`trigger`](Self::trigger) pushes the deadline back, so a burst of
/// triggers fires the action once. The action runs on the timer thread;
/// triggers made while it runs schedule another firing.
pub struct Debouncer {
    shared: Arc<Shared>,
    delay: Duration,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Starts the timer thread.
    pub fn new(delay: Duration, action: impl Fn() + Send + 'static) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState::default()),
            signal: Condvar::new(),
        });

        let timer = {
            let shared = Arc::clone(&shared);
            let action: Action = Box::new(action);
            thread::Builder::new()
                .name("svgfx-debounce".into())
                .spawn(move || run_timer(&shared, &action))
                .inspect_err(|e| tracing::error!(error = %e, "Failed to spawn debounce timer"))
                .ok()
        };

        Self { shared, delay, timer }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)starts the countdown.
    pub fn trigger(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = Some(Instant::now() + self.delay);
        self.shared.signal.notify_one();
    }

    /// Returns true while a firing is scheduled.
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }
}

fn run_timer(shared: &Shared, action: &Action) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        let deadline = state.deadline;
        match deadline {
            None => shared.signal.wait(&mut state),
            Some(deadline) if Instant::now() >= deadline => {
                state.deadline = None;
                MutexGuard::unlocked(&mut state, || action());
            }
            Some(deadline) => {
                shared.signal.wait_until(&mut state, deadline);
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.signal.notify_one();
        }
        if let Some(timer) = self.timer.take() {
            // The action may end up owning the debouncer's owner.
            if timer.thread().id() != thread::current().id() && timer.join().is_err() {
                tracing::error!("Debounce timer panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(delay_ms: u64) -> (Debouncer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let debouncer = Debouncer::new(Duration::from_millis(delay_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (debouncer, fired)
    }

    fn wait_for(fired: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while fired.load(Ordering::SeqCst) < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn burst_fires_once() {
        let (debouncer, fired) = counting(100);
        for _ in 0..10 {
            debouncer.trigger();
            thread::sleep(Duration::from_millis(2));
        }
        assert!(debouncer.is_pending());

        wait_for(&fired, 1);
        thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let (debouncer, fired) = counting(20);
        debouncer.trigger();
        wait_for(&fired, 1);
        debouncer.trigger();
        wait_for(&fired, 2);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn trigger_restarts_countdown() {
        let (debouncer, fired) = counting(100);
        let start = Instant::now();
        debouncer.trigger();
        thread::sleep(Duration::from_millis(60));
        debouncer.trigger();
        wait_for(&fired, 1);
        assert!(start.elapsed() >= Duration::from_millis(160));
    }

    #[test]
    fn drop_cancels_pending_firing() {
        let (debouncer, fired) = counting(50);
        debouncer.trigger();
        drop(debouncer);
        thread::sleep(Duration::from_millis(120));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
