//! Transient byte handles (object-URL equivalents).
//!
//! A handle exposes a file's bytes to a playback element under an opaque
//! `blob:` style URL. Handles revoke themselves on drop, so every exit path of
//! an engine releases what it registered.

use bytes::Bytes;
use reelkit_core::models::MediaFile;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct HandleEntry {
    mime_type: String,
    bytes: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct HandleRegistry {
    entries: Arc<Mutex<HashMap<Uuid, HandleEntry>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the entries, recovering the map if a holder panicked.
    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, HandleEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `file` and return a handle that revokes on drop.
    pub fn register(&self, file: &MediaFile) -> TransientHandle {
        let id = Uuid::new_v4();
        let entry = HandleEntry {
            mime_type: file.mime_type.clone(),
            bytes: file.bytes.clone(),
        };
        self.entries().insert(id, entry);
        tracing::debug!(handle = %id, file_name = %file.file_name, "Transient handle registered");
        TransientHandle {
            id,
            mime_type: file.mime_type.clone(),
            registry: self.clone(),
        }
    }

    /// Bytes behind a live handle URL, `None` once revoked.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        let id = url.strip_prefix("blob:reelkit/")?.parse::<Uuid>().ok()?;
        self.entries().get(&id).map(|entry| entry.bytes.clone())
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn revoke(&self, id: Uuid) {
        if self.entries().remove(&id).is_some() {
            tracing::debug!(handle = %id, "Transient handle revoked");
        }
    }

    fn mime_type_of(&self, id: Uuid) -> Option<String> {
        self.entries().get(&id).map(|entry| entry.mime_type.clone())
    }
}

/// A live registration. Dropping it revokes the URL.
#[derive(Debug)]
pub struct TransientHandle {
    id: Uuid,
    mime_type: String,
    registry: HandleRegistry,
}

impl TransientHandle {
    pub fn url(&self) -> String {
        format!("blob:reelkit/{}", self.id)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Bytes behind the handle. Always `Some` while the handle is alive.
    pub fn bytes(&self) -> Option<Bytes> {
        self.registry.resolve(&self.url())
    }

    pub fn is_live(&self) -> bool {
        self.registry.mime_type_of(self.id).is_some()
    }
}

impl Drop for TransientHandle {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_revokes_on_drop() {
        let registry = HandleRegistry::new();
        let file = MediaFile::new("clip.gif", "image/gif", vec![1u8, 2, 3]);

        let handle = registry.register(&file);
        let url = handle.url();
        assert!(url.starts_with("blob:reelkit/"));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(handle.bytes().unwrap().as_ref(), &[1u8, 2, 3]);
        assert!(handle.is_live());

        drop(handle);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.resolve(&url).is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = HandleRegistry::new();
        let other = registry.clone();
        let file = MediaFile::new("a.png", "image/png", vec![0u8]);
        let _first = registry.register(&file);
        let _second = other.register(&file);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_poisoned_registry_still_tracks_handles() {
        let registry = HandleRegistry::new();
        let holder = registry.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.entries.lock().unwrap();
            panic!("holder panicked");
        })
        .join();
        assert!(registry.entries.is_poisoned());

        let file = MediaFile::new("clip.gif", "image/gif", vec![7u8]);
        let handle = registry.register(&file);
        assert_eq!(registry.live_count(), 1);
        assert!(handle.is_live());
        assert_eq!(handle.bytes().unwrap().as_ref(), &[7u8]);

        drop(handle);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_resolve_rejects_foreign_urls() {
        let registry = HandleRegistry::new();
        assert!(registry.resolve("https://example.com/a.png").is_none());
        assert!(registry.resolve("blob:reelkit/not-a-uuid").is_none());
    }
}
