//! Fixed-size thread pool for background downloads.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Builds a pool of `size` (at least one) named download threads.
///
/// A panicking job is logged and does not take its worker down.
pub fn download_pool(size: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(size.max(1))
        .thread_name(|index| format!("svgfx-download-{index}"))
        .panic_handler(|_| tracing::error!("Background job panicked"))
        .build()?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn runs_every_job() {
        let pool = download_pool(5).unwrap();
        assert_eq!(pool.current_num_threads(), 5);

        let (tx, rx) = mpsc::channel();
        for job in 0..50 {
            let tx = tx.clone();
            pool.spawn(move || tx.send(job).unwrap());
        }
        drop(tx);

        let mut done: Vec<i32> = rx.iter().collect();
        done.sort_unstable();
        assert_eq!(done, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn threads_are_named() {
        let pool = download_pool(1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.spawn(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        });
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("svgfx-download-0"));
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let pool = download_pool(1).unwrap();
        pool.spawn(|| panic!("boom"));

        let (tx, rx) = mpsc::channel();
        pool.spawn(move || tx.send(()).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn zero_size_gets_one_thread() {
        assert_eq!(download_pool(0).unwrap().current_num_threads(), 1);
    }
}
