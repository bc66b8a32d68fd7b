// src/auth/lock.rs

//! A fair (FIFO) lock guarding GSS context establishment.

use parking_lot::{const_mutex, Condvar, Mutex};

/// Serializes every challenge generation in the process. GSS libraries are
/// not guaranteed to be safe for concurrent context establishment.
pub(crate) static KERBEROS_LOCK: FairLock = FairLock::new();

/// A ticket lock: threads are granted the lock in the order they asked for it.
///
/// Not reentrant; locking twice on one thread deadlocks.
pub(crate) struct FairLock {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

struct Tickets {
    next: u64,
    serving: u64,
}

impl FairLock {
    pub(crate) const fn new() -> FairLock {
        FairLock {
            tickets: const_mutex(Tickets { next: 0, serving: 0 }),
            turn: Condvar::new(),
        }
    }

    /// Block until it is this caller's turn.
    pub(crate) fn lock(&self) -> FairGuard<'_> {
        let mut tickets = self.tickets.lock();
        let ticket = tickets.next;
        tickets.next = tickets.next.wrapping_add(1);
        while tickets.serving != ticket {
            self.turn.wait(&mut tickets);
        }
        log::trace!("negotiate lock acquired (ticket {})", ticket);
        FairGuard { lock: self, ticket }
    }
}

/// Releases the lock on drop, including during unwinding.
pub(crate) struct FairGuard<'a> {
    lock: &'a FairLock,
    ticket: u64,
}

impl Drop for FairGuard<'_> {
    fn drop(&mut self) {
        let mut tickets = self.lock.tickets.lock();
        tickets.serving = tickets.serving.wrapping_add(1);
        drop(tickets);
        // every waiter checks its own ticket, so wake them all
        self.lock.turn.notify_all();
        log::trace!("negotiate lock released (ticket {})", self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_released_on_drop() {
        let lock = FairLock::new();
        drop(lock.lock());
        // would deadlock if the first guard had not released
        drop(lock.lock());
    }

    #[test]
    fn test_released_on_panic() {
        let lock = Arc::new(FairLock::new());
        let inner = lock.clone();
        let joined = thread::spawn(move || {
            let _guard = inner.lock();
            panic!("provider blew up");
        })
        .join();
        assert!(joined.is_err());
        drop(lock.lock());
    }

    #[test]
    fn test_mutual_exclusion() {
        let lock = Arc::new(FairLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock.lock();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_fifo_order() {
        let lock = Arc::new(FairLock::new());
        let order = Arc::new(StdMutex::new(Vec::new()));

        let held = lock.lock();
        let mut handles = Vec::new();
        for i in 0..4 {
            let worker_lock = lock.clone();
            let order = order.clone();
            handles.push(thread::spawn(move || {
                let _guard = worker_lock.lock();
                order.lock().unwrap().push(i);
            }));
            // wait until thread `i` has taken its ticket
            while lock.tickets.lock().next != i as u64 + 2 {
                thread::sleep(Duration::from_millis(1));
            }
        }
        drop(held);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }
}
