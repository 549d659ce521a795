//! Replay protection for request nonces.
//!
//! Verification consults a [`NonceStore`] to learn whether an `(id, nonce)` pair has been used
//! before, and records the pair once the request has been authenticated.  [`NonceCache`] is a
//! simple in-memory store suitable for a single server process.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

/// The window used when none is given: one minute either side of the server's clock.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Number of expired entries purged by each insert.  Purging is incremental so that a single
/// insert never stalls on a large backlog.
const PURGE_PER_INSERT: usize = 5;

/// Storage for nonces that have already been used.
///
/// Implementations must be safe to share between concurrent verifications.  `check` calls
/// `seen` and later `record_until` for the same pair, and does not assume the two are atomic.
///
/// A recorded nonce must be reported as seen for as long as the timestamp check could still
/// accept a request carrying it, or a replay slips through once the entry is dropped.
pub trait NonceStore {
    /// Has this nonce already been used by this id?
    fn seen(&self, id: &str, nonce: &str, ts: SystemTime) -> bool;

    /// Remember that this nonce has been used by this id, with the request's timestamp.
    fn record(&self, id: &str, nonce: &str, ts: SystemTime);

    /// Like `record`, but the entry must be kept through `keep_until` inclusive: the last
    /// instant at which the verifier would accept `ts`.
    ///
    /// The default forwards to `record`, which suits stores that never expire entries.
    fn record_until(&self, id: &str, nonce: &str, ts: SystemTime, _keep_until: SystemTime) {
        self.record(id, nonce, ts)
    }
}

type Clock = Box<dyn Fn() -> SystemTime + Send + Sync>;
type NonceKey = (String, String);

/// Entries are keyed by `(id, nonce)` and hold the instant through which they are kept.
#[derive(Default)]
struct Entries {
    items: HashMap<NonceKey, SystemTime>,
    purge_queue: BinaryHeap<Reverse<(SystemTime, NonceKey)>>,
}

impl Entries {
    /// Drop the oldest queued entry.  Returns false when the queue is empty.
    fn purge_oldest(&mut self) -> bool {
        match self.purge_queue.pop() {
            Some(Reverse((expiry, key))) => {
                // the key may have been re-recorded since this queue entry was pushed
                if self.items.get(&key) == Some(&expiry) {
                    self.items.remove(&key);
                }
                true
            }
            None => false,
        }
    }
}

/// An in-memory [`NonceStore`].
///
/// Each nonce is remembered through `window` after its timestamp, or through the instant the
/// verifier asks for in `record_until` if that is later; after that, the timestamp check alone
/// rejects a replay.  Expired entries are purged a few at a time as new ones are recorded.
///
/// With `max_size` set, the oldest entries are evicted to stay under that size even if they have
/// not expired.  This bounds memory at the cost of possibly admitting a replay.
///
/// # Examples
///
/// ```
/// use hawkauth::{NonceCache, NonceStore};
/// use std::time::{Duration, SystemTime};
///
/// let cache = NonceCache::new(Duration::from_secs(60)).with_max_size(10000);
/// let now = SystemTime::now();
/// assert!(!cache.seen("dh37fgj492je", "j4h3g2", now));
/// cache.record("dh37fgj492je", "j4h3g2", now);
/// assert!(cache.seen("dh37fgj492je", "j4h3g2", now));
/// ```
pub struct NonceCache {
    window: Duration,
    max_size: Option<usize>,
    clock: Clock,
    entries: Mutex<Entries>,
}

impl NonceCache {
    pub fn new(window: Duration) -> Self {
        NonceCache {
            window,
            max_size: None,
            clock: Box::new(SystemTime::now),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Limit the number of remembered nonces.  A size of zero is treated as one.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size.max(1));
        self
    }

    /// Use `clock` instead of the system clock to decide expiry.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of remembered nonces, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // the entries are consistent between statements, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, id: &str, nonce: &str, expiry: SystemTime) {
        let now = (self.clock)();
        let mut entries = self.lock();

        if let Some(max_size) = self.max_size {
            while entries.items.len() >= max_size {
                if !entries.purge_oldest() {
                    break;
                }
            }
        }

        for _ in 0..PURGE_PER_INSERT {
            let expired = match entries.purge_queue.peek() {
                Some(Reverse((oldest, _))) => *oldest < now,
                None => false,
            };
            if !expired {
                break;
            }
            entries.purge_oldest();
        }

        let key = (id.to_string(), nonce.to_string());
        entries.items.insert(key.clone(), expiry);
        entries.purge_queue.push(Reverse((expiry, key)));
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        NonceCache::new(DEFAULT_WINDOW)
    }
}

impl NonceStore for NonceCache {
    fn seen(&self, id: &str, nonce: &str, _ts: SystemTime) -> bool {
        let now = (self.clock)();
        let key = (id.to_string(), nonce.to_string());
        match self.lock().items.get(&key) {
            Some(&expiry) => expiry >= now,
            None => false,
        }
    }

    fn record(&self, id: &str, nonce: &str, ts: SystemTime) {
        self.record_until(id, nonce, ts, ts)
    }

    fn record_until(&self, id: &str, nonce: &str, ts: SystemTime, keep_until: SystemTime) {
        let expiry = match ts.checked_add(self.window) {
            Some(expiry) => expiry.max(keep_until),
            None => ts.max(keep_until),
        };
        self.insert(id, nonce, expiry);
    }
}

impl fmt::Debug for NonceCache {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NonceCache")
            .field("window", &self.window)
            .field("max_size", &self.max_size)
            .field("len", &self.len())
            .finish()
    }
}
