//! Authz cache: keyed by `(granter_address, msg_type_url)`, value is the
//! granter plus its grantees ("warm keys") allowed to sign on its behalf
//! for that message type. Entries expire after a TTL and are refreshed on
//! next access.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use node_types::Address;

use node_crypto::Ed25519PublicKey;

#[derive(Clone)]
pub struct GrantEntry {
    pub address: Address,
    pub pubkey: Ed25519PublicKey,
}

struct CacheEntry {
    grantees: Vec<GrantEntry>,
    inserted_at: Instant,
}

pub struct AuthzCache {
    entries: DashMap<(Address, String), CacheEntry>,
    ttl: Duration,
}

impl AuthzCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    /// Returns the cached grantee list for `(granter, msg_type)`, calling
    /// `fetch` on a miss or expiry. `fetch` failures are not cached.
    pub fn get_or_fetch<F, E>(
        &self,
        granter: &Address,
        msg_type: &str,
        fetch: F,
    ) -> Result<Vec<GrantEntry>, E>
    where
        F: FnOnce() -> Result<Vec<GrantEntry>, E>,
    {
        let key = (granter.clone(), msg_type.to_string());
        if let Some(entry) = self.entries.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(entry.grantees.clone());
            }
        }
        let fetched = fetch()?;
        self.entries.insert(
            key,
            CacheEntry { grantees: fetched.clone(), inserted_at: Instant::now() },
        );
        Ok(fetched)
    }

    pub fn invalidate(&self, granter: &Address, msg_type: &str) {
        self.entries.remove(&(granter.clone(), msg_type.to_string()));
    }

    /// Non-blocking cache peek, for async callers that drive the fetch
    /// themselves and call [`Self::put`] on a miss.
    pub fn peek(&self, granter: &Address, msg_type: &str) -> Option<Vec<GrantEntry>> {
        let key = (granter.clone(), msg_type.to_string());
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.grantees.clone())
        } else {
            None
        }
    }

    pub fn put(&self, granter: &Address, msg_type: &str, grantees: Vec<GrantEntry>) {
        let key = (granter.clone(), msg_type.to_string());
        self.entries.insert(key, CacheEntry { grantees, inserted_at: Instant::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn caches_fetch_result_until_ttl_expires() {
        let cache = AuthzCache::new(Duration::from_millis(20));
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(vec![])
        };
        cache.get_or_fetch(&"granter".to_string(), "/x.Msg", fetch).unwrap();
        cache.get_or_fetch(&"granter".to_string(), "/x.Msg", fetch).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        std::thread::sleep(Duration::from_millis(30));
        cache.get_or_fetch(&"granter".to_string(), "/x.Msg", fetch).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
