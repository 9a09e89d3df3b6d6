//! InMemoryMetadataStore - 開発・テスト用の MetadataStore
//!
//! 本番ではドキュメント DB のアダプタが同じ trait を実装します。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ImageIdentifier, ImageMetadata, ImageRecord, OwnerKey, StorageError};
use crate::ports::{Clock, MetadataStore, SystemClock};

type RecordKey = (OwnerKey, ImageIdentifier);

/// InMemoryMetadataStore はメモリ上の MetadataStore
///
/// `set_available(false)` で接続できない DB を模擬します。
pub struct InMemoryMetadataStore<C = SystemClock> {
    records: Mutex<HashMap<RecordKey, ImageRecord>>,
    available: AtomicBool,
    clock: C,
}

impl InMemoryMetadataStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryMetadataStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryMetadataStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            clock,
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RecordKey, ImageRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn key(owner: &OwnerKey, image: &ImageIdentifier) -> RecordKey {
    (owner.clone(), image.clone())
}

#[async_trait]
impl<C: Clock + 'static> MetadataStore for InMemoryMetadataStore<C> {
    async fn insert(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        metadata: ImageMetadata,
    ) -> Result<(), StorageError> {
        let now = self.clock.now();
        let mut records = self.lock();
        match records.get_mut(&key(owner, image)) {
            Some(record) => record.replace(metadata, now),
            None => {
                records.insert(key(owner, image), ImageRecord::new(metadata, now));
            }
        }
        Ok(())
    }

    async fn update(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        metadata: ImageMetadata,
    ) -> Result<(), StorageError> {
        let now = self.clock.now();
        let mut records = self.lock();
        let record = records
            .get_mut(&key(owner, image))
            .ok_or_else(|| StorageError::not_found(owner, image))?;
        record.replace(metadata, now);
        Ok(())
    }

    async fn load(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<ImageRecord, StorageError> {
        self.lock()
            .get(&key(owner, image))
            .cloned()
            .ok_or_else(|| StorageError::not_found(owner, image))
    }

    async fn delete(&self, owner: &OwnerKey, image: &ImageIdentifier) -> Result<(), StorageError> {
        self.lock()
            .remove(&key(owner, image))
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(owner, image))
    }

    async fn exists(&self, owner: &OwnerKey, image: &ImageIdentifier) -> bool {
        self.lock().contains_key(&key(owner, image))
    }

    async fn last_modified(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<DateTime<Utc>, StorageError> {
        self.lock()
            .get(&key(owner, image))
            .map(|record| record.updated)
            .ok_or_else(|| StorageError::not_found(owner, image))
    }

    async fn status(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn keys() -> (OwnerKey, ImageIdentifier) {
        (
            OwnerKey::parse("publickey").unwrap(),
            ImageIdentifier::parse("929db9c5fc3099f7576f5655207eba47").unwrap(),
        )
    }

    fn metadata(width: u32) -> ImageMetadata {
        ImageMetadata {
            size: 41423,
            mime_type: "image/png".to_string(),
            extension: "png".to_string(),
            width,
            height: 417,
            checksum: "929db9c5fc3099f7576f5655207eba47".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_load() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let store = InMemoryMetadataStore::with_clock(FixedClock::new(t));
        let (owner, image) = keys();

        assert!(!store.exists(&owner, &image).await);
        store.insert(&owner, &image, metadata(665)).await.unwrap();
        assert!(store.exists(&owner, &image).await);

        let record = store.load(&owner, &image).await.unwrap();
        assert_eq!(record.metadata, metadata(665));
        assert_eq!(record.added, t);
        assert_eq!(record.updated, t);
    }

    #[tokio::test]
    async fn reinsert_keeps_added_and_bumps_updated() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(t1));
        let store = InMemoryMetadataStore::with_clock(clock.clone());
        let (owner, image) = keys();

        store.insert(&owner, &image, metadata(665)).await.unwrap();
        clock.advance(Duration::seconds(30));
        store.insert(&owner, &image, metadata(700)).await.unwrap();

        let record = store.load(&owner, &image).await.unwrap();
        assert_eq!(record.added, t1);
        assert_eq!(record.updated, t1 + Duration::seconds(30));
        assert_eq!(record.metadata.width, 700);
        assert_eq!(
            store.last_modified(&owner, &image).await.unwrap(),
            t1 + Duration::seconds(30)
        );
    }

    #[tokio::test]
    async fn update_requires_existing_record() {
        let store = InMemoryMetadataStore::new();
        let (owner, image) = keys();

        let err = store.update(&owner, &image, metadata(1)).await.unwrap_err();
        assert!(err.is_not_found());

        store.insert(&owner, &image, metadata(1)).await.unwrap();
        store.update(&owner, &image, metadata(2)).await.unwrap();
        assert_eq!(store.load(&owner, &image).await.unwrap().metadata.width, 2);
    }

    #[tokio::test]
    async fn delete_and_missing_records() {
        let store = InMemoryMetadataStore::new();
        let (owner, image) = keys();

        store.insert(&owner, &image, metadata(1)).await.unwrap();
        store.delete(&owner, &image).await.unwrap();

        assert!(!store.exists(&owner, &image).await);
        assert!(store.delete(&owner, &image).await.unwrap_err().is_not_found());
        assert!(store.load(&owner, &image).await.unwrap_err().is_not_found());
        assert!(
            store
                .last_modified(&owner, &image)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn status_follows_availability() {
        let store = InMemoryMetadataStore::new();
        assert!(store.status().await);

        store.set_available(false);
        assert!(!store.status().await);
    }
}
