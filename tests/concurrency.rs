use std::{
    cell::UnsafeCell,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use tally::{Arc, Cleanup, Scoped};

const THREADS: usize = 4;
const CYCLES: usize = 1000;

#[derive(Debug, Default)]
struct Probe {
    cleanups: AtomicUsize,
    sum: AtomicUsize,
}

/// One slot per thread. Each thread writes only its own slot.
struct Slots(Box<[UnsafeCell<usize>]>);

unsafe impl Sync for Slots {}

struct Payload<'a> {
    slots: Slots,
    probe: &'a Probe,
}

impl<'a> Payload<'a> {
    fn new(probe: &'a Probe) -> Self {
        let slots = (0..THREADS).map(|_| UnsafeCell::new(0)).collect();
        Self {
            slots: Slots(slots),
            probe,
        }
    }
}

impl Cleanup for Payload<'_> {
    fn cleanup(&mut self) {
        let sum = self.slots.0.iter_mut().map(|s| *s.get_mut()).sum();
        self.probe.sum.store(sum, Ordering::Relaxed);
        self.probe.cleanups.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn cycles_leave_the_count_unchanged() {
    let probe = Probe::default();
    let owner = Arc::new(Payload::new(&probe));

    thread::scope(|s| {
        for _ in 0..THREADS {
            let token = owner.get_ref();
            s.spawn(move || {
                for _ in 0..CYCLES {
                    let r = token.get_ref();
                    r.release();
                }
                token.release();
            });
        }
    });

    assert_eq!(owner.count(), 1);
    assert_eq!(probe.cleanups.load(Ordering::Relaxed), 0);

    owner.release();
    assert_eq!(probe.cleanups.load(Ordering::Relaxed), 1);
}

#[test]
fn raw_acquisitions_balance_across_threads() {
    let probe = Probe::default();
    let owner = Arc::new(Payload::new(&probe));

    thread::scope(|s| {
        for _ in 0..THREADS {
            let owner = &owner;
            s.spawn(move || {
                for _ in 0..CYCLES {
                    let _ = owner.get();
                    owner.retain();
                    unsafe {
                        owner.release_untracked();
                        owner.release_untracked();
                    }
                }
            });
        }
    });

    assert_eq!(owner.count(), 1);
    owner.release();
    assert_eq!(probe.cleanups.load(Ordering::Relaxed), 1);
}

#[test]
fn whichever_thread_releases_last_destroys_once() {
    for _ in 0..16 {
        let probe = Probe::default();
        let owner = Arc::new(Payload::new(&probe));

        thread::scope(|s| {
            for i in 0..THREADS {
                let token = owner.get_ref();
                s.spawn(move || {
                    let ptr = token.leak();
                    for n in 1..=CYCLES {
                        token.get_ref().release();
                        unsafe { *(*ptr.as_ptr()).slots.0[i].get() = n * (i + 1) };
                    }
                    token.release();
                });
            }
            owner.release();
        });

        assert_eq!(probe.cleanups.load(Ordering::Relaxed), 1);
        let expected = (1..=THREADS).map(|i| CYCLES * i).sum::<usize>();
        assert_eq!(probe.sum.load(Ordering::Relaxed), expected);
    }
}

#[test]
fn scoped_clones_across_threads() {
    let probe = Probe::default();
    let owner = Scoped::new(Arc::new(Payload::new(&probe)));

    thread::scope(|s| {
        for _ in 0..THREADS {
            let scoped = owner.clone();
            s.spawn(move || {
                for _ in 0..CYCLES {
                    let copy = scoped.clone();
                    assert!(Scoped::count(&copy) >= 2);
                }
            });
        }
    });

    assert_eq!(Scoped::count(&owner), 1);
    drop(owner);
    assert_eq!(probe.cleanups.load(Ordering::Relaxed), 1);
}
