//! Session cache with per-entry expiry
//!
//! Entries expire lazily on read and are swept by a background task.
//! DashMap shards its locks, so users never contend on a global lock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Longest lifetime a session entry may have; longer TTLs are clamped
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Injected session store
pub trait SessionCache: Send + Sync {
    /// Store `token` for `user_id`, replacing any previous token
    fn set(&self, user_id: i64, token: &[u8], ttl: Duration);

    /// Current token, or `None` when unset or expired
    fn get(&self, user_id: i64) -> Option<Vec<u8>>;
}

#[derive(Debug, Clone)]
struct SessionEntry {
    token: Vec<u8>,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local session cache. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySessionCache {
    entries: DashMap<i64, SessionEntry>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> SessionCacheStats {
        let now = Instant::now();
        let total = self.entries.len();
        let expired = self.entries.iter().filter(|e| e.is_expired(now)).count();
        SessionCacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

impl SessionCache for InMemorySessionCache {
    fn set(&self, user_id: i64, token: &[u8], ttl: Duration) {
        self.entries.insert(
            user_id,
            SessionEntry {
                token: token.to_vec(),
                expires_at: Instant::now() + ttl.min(MAX_SESSION_TTL),
            },
        );
    }

    fn get(&self, user_id: i64) -> Option<Vec<u8>> {
        let now = Instant::now();
        let entry = self.entries.get(&user_id)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove_if(&user_id, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry.token.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Spawn a background task that sweeps expired sessions every minute
pub fn spawn_cleanup_task(cache: Arc<InMemorySessionCache>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_secs(60);
        loop {
            tokio::time::sleep(interval).await;
            let removed = cache.cleanup();
            if removed > 0 {
                debug!("Session cleanup: removed {} expired entries", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MINUTES: Duration = Duration::from_secs(600);

    #[test]
    fn test_set_then_get() {
        let cache = InMemorySessionCache::new();
        cache.set(42, b"awaiting-search", TEN_MINUTES);
        assert_eq!(cache.get(42), Some(b"awaiting-search".to_vec()));
        assert_eq!(cache.get(43), None);
    }

    #[test]
    fn test_get_does_not_consume() {
        let cache = InMemorySessionCache::new();
        cache.set(42, b"awaiting-search", TEN_MINUTES);
        assert!(cache.get(42).is_some());
        assert!(cache.get(42).is_some());
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let cache = InMemorySessionCache::new();
        cache.set(42, b"awaiting-search", Duration::MAX);
        assert_eq!(cache.get(42), Some(b"awaiting-search".to_vec()));
    }

    #[test]
    fn test_set_overwrites() {
        let cache = InMemorySessionCache::new();
        cache.set(42, b"first", TEN_MINUTES);
        cache.set(42, b"second", TEN_MINUTES);
        assert_eq!(cache.get(42), Some(b"second".to_vec()));
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemorySessionCache::new();
        cache.set(42, b"awaiting-search", Duration::from_millis(30));
        assert!(cache.get(42).is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get(42), None);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_cleanup_sweeps_only_expired() {
        let cache = InMemorySessionCache::new();
        cache.set(1, b"short", Duration::from_millis(10));
        cache.set(2, b"long", TEN_MINUTES);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.get(2), Some(b"long".to_vec()));
    }

    #[test]
    fn test_concurrent_users_do_not_interfere() {
        let cache = Arc::new(InMemorySessionCache::new());
        let handles: Vec<_> = (0..8i64)
            .map(|user| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set(user, user.to_string().as_bytes(), TEN_MINUTES);
                        assert_eq!(cache.get(user), Some(user.to_string().into_bytes()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.stats().active_entries, 8);
    }
}
