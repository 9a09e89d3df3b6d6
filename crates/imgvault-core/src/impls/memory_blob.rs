//! InMemoryBlobStore - 開発・テスト用の BlobStore
//!
//! FilesystemBlobStore と同じ契約（既存キーは touch のみ、存在しなければ NotFound）を
//! Mutex + HashMap で満たします。プロセス終了で内容は消えます。

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};

use crate::domain::{ImageIdentifier, OwnerKey, StorageError};
use crate::ports::{BlobStore, Clock, SystemClock};

const LOCATION: &str = "memory";

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

type BlobKey = (OwnerKey, ImageIdentifier);

/// InMemoryBlobStore はメモリ上の BlobStore
///
/// # 可用性の切り替え
/// `set_available(false)` で書き込み不可のストレージを模擬できます
/// （`status()` が false、`store` が `StorageUnavailable`）。
pub struct InMemoryBlobStore<C = SystemClock> {
    blobs: Mutex<HashMap<BlobKey, StoredBlob>>,
    available: AtomicBool,
    clock: C,
}

impl InMemoryBlobStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryBlobStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryBlobStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            clock,
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BlobKey, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_blob<T>(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        f: impl FnOnce(&StoredBlob) -> T,
    ) -> Result<T, StorageError> {
        self.lock()
            .get(&(owner.clone(), image.clone()))
            .map(f)
            .ok_or_else(|| StorageError::not_found(owner, image))
    }
}

#[async_trait]
impl<C: Clock + 'static> BlobStore for InMemoryBlobStore<C> {
    async fn store(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        data: &[u8],
    ) -> Result<bool, StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(LOCATION));
        }

        let now = self.clock.now();
        self.lock()
            .entry((owner.clone(), image.clone()))
            .and_modify(|blob| blob.modified = now)
            .or_insert_with(|| StoredBlob {
                data: data.to_vec(),
                modified: now,
            });
        Ok(true)
    }

    async fn delete(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<bool, StorageError> {
        self.lock()
            .remove(&(owner.clone(), image.clone()))
            .map(|_| true)
            .ok_or_else(|| StorageError::not_found(owner, image))
    }

    async fn retrieve(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<Vec<u8>, StorageError> {
        self.with_blob(owner, image, |blob| blob.data.clone())
    }

    async fn last_modified(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<DateTime<Utc>, StorageError> {
        self.with_blob(owner, image, |blob| blob.modified.trunc_subsecs(0))
    }

    async fn exists(&self, owner: &OwnerKey, image: &ImageIdentifier) -> bool {
        self.lock().contains_key(&(owner.clone(), image.clone()))
    }

    async fn status(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
