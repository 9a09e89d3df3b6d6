//! MetadataStore port - 画像メタデータの正本（ドキュメント DB または InMemory）
//!
//! BlobStore と同じ (OwnerKey, ImageIdentifier) をキーにし、
//! 存在確認・ステータスの契約も BlobStore に揃えています。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ImageIdentifier, ImageMetadata, ImageRecord, OwnerKey, StorageError};

/// MetadataStore は画像ごとのメタデータレコードを管理
///
/// # 契約
/// - `insert` は upsert（既存なら `added` を維持して `updated` を進める）
/// - `update` / `load` / `delete` / `last_modified` は存在しないキーに `NotFound`
/// - `exists` / `status` は失敗しない
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        metadata: ImageMetadata,
    ) -> Result<(), StorageError>;

    async fn update(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        metadata: ImageMetadata,
    ) -> Result<(), StorageError>;

    async fn load(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<ImageRecord, StorageError>;

    async fn delete(&self, owner: &OwnerKey, image: &ImageIdentifier) -> Result<(), StorageError>;

    async fn exists(&self, owner: &OwnerKey, image: &ImageIdentifier) -> bool;

    /// レコードの `updated`
    async fn last_modified(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<DateTime<Utc>, StorageError>;

    /// ヘルスチェック用: DB に到達できるか
    async fn status(&self) -> bool;
}
