//! Single-flight guard for frame transfers

use std::sync::atomic::{AtomicBool, Ordering};

/// Flag that is set while a transfer is in flight
#[derive(Debug, Default)]
pub struct SendFlag(AtomicBool);

impl SendFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Try to start a transfer. Returns `None` if one is already running.
    pub fn try_acquire(&self) -> Option<SendGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SendGuard { flag: &self.0 })
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held for the duration of one transfer. The flag is cleared when dropped,
/// on every exit path including unwinding.
#[derive(Debug)]
pub struct SendGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails() {
        let flag = SendFlag::new();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none());
        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }

    #[test]
    fn released_on_panic() {
        let flag = SendFlag::new();
        let result = std::panic::catch_unwind(|| {
            let _guard = flag.try_acquire().unwrap();
            panic!("encoder blew up");
        });
        assert!(result.is_err());
        assert!(!flag.is_set());
    }

    #[test]
    fn one_winner_across_threads() {
        let flag = SendFlag::new();
        let barrier = std::sync::Barrier::new(8);
        let wins = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        // keep the guard alive until everyone has tried
                        let guard = flag.try_acquire();
                        barrier.wait();
                        guard.is_some()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(wins, 1);
    }
}
