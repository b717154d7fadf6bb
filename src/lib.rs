//! Cache-backed user session store.
//!
//! A [`SessionManager`] keeps one [`UserSession`] aggregate per authenticated
//! user in an expiring key-value cache, with the per-device
//! [`ClientSession`] entries nested inside it. The cache is the single source
//! of truth: every operation loads the aggregate, mutates it in memory and
//! writes the whole thing back (or deletes it once its expiry has lapsed).

pub mod config;
pub mod error;

pub mod cache {
    pub mod expiring;
    pub mod memory;
    pub mod redis;
}

pub mod models {
    pub mod keys;
    pub mod session;
}

pub mod services {
    pub mod sessions;
}

pub mod http {
    pub mod response;
}

pub use cache::expiring::{CacheError, ExpiringCache};
pub use cache::memory::MemoryCache;
pub use cache::redis::RedisCache;
pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use models::keys::{Entity, SessionKey};
pub use models::session::{ClientSession, UserSession};
pub use services::sessions::SessionManager;
