//! In-memory reservation store with per-key deadlines.
//!
//! Mirrors the parts of Redis the reservation core relies on: atomic
//! set-if-absent, TTL replies with the same sentinels, batched reads that
//! fail on a missing key, and `expired` keyevents published once per
//! expiration while notifications are enabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use checkout_core::error::AppError;
use checkout_core::events::{ExpiryEvent, ExpiryStream};
use checkout_core::keys;
use checkout_core::result::AppResult;
use checkout_core::traits::store::{BatchedEntry, ReservationStore};
use checkout_core::types::status::{TTL_MISSING, TTL_PERSISTENT};

/// Event classes accepted by `notify-keyspace-events`.
const EVENT_CLASSES: &str = "KEg$lshzxetmdnA";

/// Buffered events per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 1024;

/// A stored value and its deadline.
#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    deadline: Option<Instant>,
    /// Distinguishes successive values of the same key so a stale timer
    /// never removes a newer one.
    generation: u64,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug)]
struct Inner {
    entries: DashMap<String, StoredValue>,
    generation: AtomicU64,
    notify_enabled: AtomicBool,
    events: broadcast::Sender<(String, String)>,
    channel: String,
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    fn publish_expired(&self, key: &str) {
        debug!(key, "Key expired");
        if self.notify_enabled.load(Ordering::Acquire) {
            // No receivers means nobody is subscribed; the event is dropped.
            let _ = self.events.send((self.channel.clone(), key.to_string()));
        }
    }

    fn expire_if_current(&self, key: &str, generation: u64) {
        if self
            .entries
            .remove_if(key, |_, stored| stored.generation == generation)
            .is_some()
        {
            self.publish_expired(key);
        }
    }

    /// Insert unless a live value exists. A lapsed value that no timer has
    /// removed yet is replaced and reported as expired.
    fn insert_if_absent(&self, key: &str, value: &str, deadline: Option<Instant>) -> Option<u64> {
        let now = Instant::now();
        let generation = self.next_generation();
        let stored = StoredValue {
            value: value.to_string(),
            deadline,
            generation,
        };

        let replaced_lapsed = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return None;
                }
                occupied.insert(stored);
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                false
            }
        };

        if replaced_lapsed {
            self.publish_expired(key);
        }
        Some(generation)
    }

    fn live(&self, key: &str) -> Option<StoredValue> {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|stored| stored.clone())
            .filter(|stored| stored.is_live(now))
    }
}

/// In-process reservation store.
#[derive(Debug, Clone)]
pub struct MemoryReservationStore {
    inner: Arc<Inner>,
}

impl Default for MemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReservationStore {
    /// Create an empty store publishing on database 0's keyevent channel.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                generation: AtomicU64::new(0),
                notify_enabled: AtomicBool::new(false),
                events,
                channel: keys::expired_event_pattern(0),
            }),
        }
    }

    fn schedule_expiry(&self, key: &str, generation: u64, deadline: Instant) {
        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.expire_if_current(&key, generation);
        });
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let Some(deadline) = Instant::now().checked_add(ttl) else {
            return Err(AppError::store(format!(
                "invalid expire time in 'set' command: {}s",
                ttl.as_secs()
            )));
        };
        match self.inner.insert_if_absent(key, value, Some(deadline)) {
            Some(generation) => {
                self.schedule_expiry(key, generation, deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_nx_keep_ttl(&self, key: &str, value: &str) -> AppResult<bool> {
        // An absent key has no expiry to keep.
        Ok(self.inner.insert_if_absent(key, value, None).is_some())
    }

    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.inner.live(key).map(|stored| stored.value))
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        Ok(self
            .inner
            .live(key)
            .map_or(TTL_MISSING, |stored| ttl_reply(stored.deadline)))
    }

    async fn get_with_ttl(&self, key: &str) -> AppResult<BatchedEntry> {
        let Some(stored) = self.inner.live(key) else {
            return Err(AppError::not_found(format!(
                "Pipeline execution failed: nil reply for '{key}'"
            )));
        };
        Ok(BatchedEntry {
            ttl: ttl_reply(stored.deadline),
            value: stored.value,
        })
    }

    async fn enable_expiry_events(&self, flags: &str) -> AppResult<()> {
        if let Some(bad) = flags.chars().find(|c| !EVENT_CLASSES.contains(*c)) {
            return Err(AppError::configuration(format!(
                "invalid keyspace event class '{bad}'"
            )));
        }
        let expired = flags.contains('E') && (flags.contains('x') || flags.contains('A'));
        self.inner.notify_enabled.store(expired, Ordering::Release);
        Ok(())
    }

    async fn psubscribe(&self, pattern: &str) -> AppResult<ExpiryStream> {
        let rx = self.inner.events.subscribe();
        let pattern = pattern.to_string();

        let stream = futures::stream::unfold(rx, move |mut rx| {
            let pattern = pattern.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok((channel, key)) => {
                            if glob_match(&pattern, &channel) {
                                return Some((Ok(ExpiryEvent::new(channel, key)), rx));
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Expiry subscriber lagged; events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// TTL reply for a live value.
fn ttl_reply(deadline: Option<Instant>) -> i64 {
    match deadline {
        None => TTL_PERSISTENT,
        Some(deadline) => {
            let left = deadline.saturating_duration_since(Instant::now());
            // Same rounding as the Redis TTL reply.
            ((left.as_millis() + 500) / 1000) as i64
        }
    }
}

/// Redis-style glob match supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
