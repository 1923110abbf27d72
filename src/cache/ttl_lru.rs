//! 带过期时间的定长 LRU 缓存
//!
//! 容量满时淘汰最久未使用的条目；写入超过 `ttl` 未再写入的条目视为不存在，
//! 读取时惰性清除。

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    written_at: Instant,
}

#[derive(Debug)]
pub struct TtlLruCache<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V> TtlLruCache<K, V> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// 当前保存的条目数（可能包含尚未清除的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 读取并刷新最近使用顺序，过期时间不变
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let ttl = self.ttl;
        let expired = match self.entries.get(key) {
            Some(entry) => is_expired(entry, ttl, now),
            None => return None,
        };

        if expired {
            self.entries.pop(key);
            return None;
        }

        self.entries.peek(key).map(|entry| &entry.value)
    }

    /// 读取但不改变使用顺序
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.entries
            .peek(key)
            .filter(|entry| !is_expired(entry, self.ttl, now))
            .map(|entry| &entry.value)
    }

    /// 写入并重置过期时间；新键插入时若已满，先清除冷端的过期条目，再按 LRU 淘汰
    pub fn set(&mut self, key: K, value: V) {
        let now = Instant::now();

        if !self.entries.contains(&key) && self.entries.len() >= self.capacity() {
            self.purge_stale_tail(now);
        }

        self.entries.put(
            key,
            Entry {
                value,
                written_at: now,
            },
        );
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.pop(key).map(|entry| entry.value)
    }

    fn purge_stale_tail(&mut self, now: Instant) {
        loop {
            let stale = matches!(
                self.entries.peek_lru(),
                Some((_, entry)) if is_expired(entry, self.ttl, now)
            );
            if !stale {
                break;
            }
            self.entries.pop_lru();
        }
    }
}

fn is_expired<V>(entry: &Entry<V>, ttl: Duration, now: Instant) -> bool {
    now.duration_since(entry.written_at) >= ttl
}
