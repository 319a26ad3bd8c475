//! TTL cache of loaded descriptors.

use std::collections::HashMap;

use modal_kernel::ModalDescriptor;
use parking_lot::RwLock;

#[derive(Debug, Clone)]
struct CachedDescriptor {
    descriptor: ModalDescriptor,
    stored_at_ms: u64,
}

/// Descriptors fetched from the loader, keyed by id.
///
/// The TTL is passed on every lookup so configuration updates apply to
/// entries that are already cached.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<String, CachedDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached descriptor younger than `ttl_secs`. Expired entries are
    /// dropped on the way out.
    pub fn get(&self, modal_id: &str, ttl_secs: u64, now_ms: u64) -> Option<ModalDescriptor> {
        let ttl_ms = ttl_secs.saturating_mul(1000);
        {
            let entries = self.entries.read();
            let cached = entries.get(modal_id)?;
            if now_ms.saturating_sub(cached.stored_at_ms) < ttl_ms {
                return Some(cached.descriptor.clone());
            }
        }
        tracing::debug!(modal_id = %modal_id, "cached descriptor expired");
        self.entries.write().remove(modal_id);
        None
    }

    pub fn insert(&self, descriptor: ModalDescriptor, now_ms: u64) {
        self.entries.write().insert(
            descriptor.id.clone(),
            CachedDescriptor {
                descriptor,
                stored_at_ms: now_ms,
            },
        );
    }

    pub fn invalidate(&self, modal_id: &str) -> bool {
        self.entries.write().remove(modal_id).is_some()
    }

    /// Drop every entry older than `ttl_secs`; returns how many were removed.
    pub fn purge_expired(&self, ttl_secs: u64, now_ms: u64) -> usize {
        let ttl_ms = ttl_secs.saturating_mul(1000);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, cached| now_ms.saturating_sub(cached.stored_at_ms) < ttl_ms);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
