// 进程内缓存

mod ttl_lru;

pub use ttl_lru::TtlLruCache;
