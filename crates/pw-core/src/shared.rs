//! A cloneable handle for recording from several places into one watch.

use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{Clock, SystemClock};
use crate::document::Document;
use crate::memory::{MemoryProbe, ProcessMemory};
use crate::recorder::{Watch, WatchError};

/// A [`Watch`] behind a mutex.
///
/// Construct one at startup and hand clones to whatever needs to record.
/// Every call takes the lock for its duration only.
#[derive(Debug)]
pub struct SharedWatch<C = SystemClock, M = ProcessMemory> {
    inner: Arc<Mutex<Watch<C, M>>>,
}

impl<C, M> Clone for SharedWatch<C, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock, M: MemoryProbe> SharedWatch<C, M> {
    pub fn new(watch: Watch<C, M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(watch)),
        }
    }

    /// Runs `f` with exclusive access to the watch.
    ///
    /// A panic in another holder does not lose the records: the lock is
    /// recovered and recording continues.
    pub fn with<R>(&self, f: impl FnOnce(&mut Watch<C, M>) -> R) -> R {
        let mut watch = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut watch)
    }

    /// Copies the current records.
    pub fn snapshot(&self) -> Document {
        self.with(|w| w.records().clone())
    }

    pub fn serialize(&self, pretty: bool) -> Result<String, WatchError> {
        self.with(|w| w.serialize(pretty))
    }
}

impl<C: Clock, M: MemoryProbe> From<Watch<C, M>> for SharedWatch<C, M> {
    fn from(watch: Watch<C, M>) -> Self {
        Self::new(watch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    #[test]
    fn clones_record_into_the_same_document() {
        let shared = SharedWatch::new(Watch::new());
        let other = shared.clone();

        shared.with(|w| w.start("request", None, None));
        other.with(|w| w.stop("request", None, None));

        let doc = shared.snapshot();
        let events = doc.group("request").unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].run_time().is_some());
    }

    #[test]
    fn threads_can_record_concurrently() {
        let shared = SharedWatch::new(Watch::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let key = format!("worker-{i}");
                    shared.with(|w| w.start("work", Some(&key), None));
                    shared.with(|w| w.stop("work", Some(&key), None));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let doc = shared.snapshot();
        let events = doc.group("work").unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.unix_end_time().is_some()));
    }

    #[test]
    fn snapshot_is_detached_from_later_records() {
        let shared = SharedWatch::from(Watch::new());
        shared.with(|w| w.detect("a", None));
        let before = shared.snapshot();
        shared.with(|w| w.detect("a", None));

        assert_eq!(before.group("a").unwrap().len(), 1);
        assert_eq!(shared.snapshot().group("a").unwrap().len(), 2);
    }
}
