use hawkauth::{NonceCache, NonceStore};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const TICK: Duration = Duration::from_millis(1);

/// A clock that only moves when told to.
#[derive(Clone)]
struct MockTime(Arc<Mutex<SystemTime>>);

impl MockTime {
    fn new() -> Self {
        MockTime(Arc::new(Mutex::new(
            UNIX_EPOCH + Duration::from_secs(1353832234),
        )))
    }

    fn time(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.0.lock().unwrap() += duration;
    }
}

fn cache(window: Duration, mocktime: &MockTime) -> NonceCache {
    let clock = mocktime.clone();
    NonceCache::new(window).with_clock(move || clock.time())
}

/// Check a nonce the way `check` does: reject if seen, otherwise record it.
fn check_nonce(nonces: &NonceCache, ts: SystemTime, nonce: &str) -> bool {
    if nonces.seen("id", nonce, ts) {
        return false;
    }
    nonces.record("id", nonce, ts);
    true
}

#[test]
fn default_window() {
    assert_eq!(NonceCache::default().window(), Duration::from_secs(60));
}

#[test]
fn operation() {
    let window = Duration::from_millis(100);
    let mocktime = MockTime::new();
    let nc = cache(window, &mocktime);

    // initially nothing is cached, so all nonces are fresh
    assert_eq!(nc.window(), window);
    assert!(nc.is_empty());
    assert!(check_nonce(&nc, mocktime.time(), "abc"));
    assert_eq!(nc.len(), 1);
    assert!(!check_nonce(&nc, mocktime.time(), "abc"));
    assert!(check_nonce(&nc, mocktime.time(), "xyz"));

    // the nonce is kept through the end of the window, then expires
    mocktime.sleep(window);
    assert!(!check_nonce(&nc, mocktime.time(), "abc"));
    mocktime.sleep(TICK);
    assert!(check_nonce(&nc, mocktime.time(), "abc"));

    // recording purges expired nonces but keeps valid ones
    mocktime.sleep(window / 2);
    assert!(check_nonce(&nc, mocktime.time(), "def"));
    assert!(!check_nonce(&nc, mocktime.time(), "abc"));
    assert!(!check_nonce(&nc, mocktime.time(), "def"));
    assert!(check_nonce(&nc, mocktime.time(), "xyz"));
    mocktime.sleep(window / 2 + TICK);
    assert!(check_nonce(&nc, mocktime.time(), "abc"));
    assert!(!check_nonce(&nc, mocktime.time(), "def"));
    assert!(!check_nonce(&nc, mocktime.time(), "xyz"));
}

#[test]
fn entries_unseen_once_expired() {
    let timeout = Duration::from_secs(1);
    let mocktime = MockTime::new();
    let nc = cache(timeout, &mocktime);
    nc.record("id", "hello", mocktime.time());
    assert!(nc.seen("id", "hello", mocktime.time()));
    mocktime.sleep(timeout / 2);
    assert!(nc.seen("id", "hello", mocktime.time()));
    mocktime.sleep(timeout / 2);
    assert!(nc.seen("id", "hello", mocktime.time()));
    mocktime.sleep(TICK);
    assert!(!nc.seen("id", "hello", mocktime.time()));
}

#[test]
fn record_until_extends_lifetime() {
    let window = Duration::from_secs(60);
    let mocktime = MockTime::new();
    let nc = cache(window, &mocktime);
    let ts = mocktime.time();
    nc.record_until("id", "hello", ts, ts + Duration::from_secs(300));
    mocktime.sleep(Duration::from_secs(300));
    assert!(nc.seen("id", "hello", ts));
    mocktime.sleep(TICK);
    assert!(!nc.seen("id", "hello", ts));
}

#[test]
fn respects_max_size() {
    let mocktime = MockTime::new();
    let nc = cache(Duration::from_secs(1), &mocktime).with_max_size(2);
    nc.record("id", "hello", mocktime.time());
    assert_eq!(nc.len(), 1);
    nc.record("id", "how", mocktime.time());
    assert_eq!(nc.len(), 2);
    nc.record("id", "you", mocktime.time());
    assert_eq!(nc.len(), 2);
    assert!(nc.seen("id", "you", mocktime.time()));
    assert!(nc.seen("id", "how", mocktime.time()));
    assert!(!nc.seen("id", "hello", mocktime.time()));
}

#[test]
fn nonces_are_per_id() {
    let nc = NonceCache::default();
    let now = SystemTime::now();
    nc.record("alice", "abc", now);
    assert!(nc.seen("alice", "abc", now));
    assert!(!nc.seen("bob", "abc", now));
}

#[test]
fn shared_between_threads() {
    let nc = Arc::new(NonceCache::default());
    let now = SystemTime::now();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let nc = nc.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    nc.record("id", &format!("{}-{}", t, i), now);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(nc.len(), 100);
    assert!(nc.seen("id", "3-24", now));
}
