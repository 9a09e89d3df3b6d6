//! BlobStore port - 画像バイト列の保存先（Filesystem / InMemory）
//!
//! BlobStore は (OwnerKey, ImageIdentifier) をキーに画像の生データを保存します。
//! メタデータは MetadataStore 側の責務で、両者の整合は上位層が保ちます。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ImageIdentifier, OwnerKey, StorageError};

/// BlobStore は画像の生データを永続化するドライバ
///
/// # 契約
/// - `store` は全体置換か touch のどちらか。既存キーへの `store` は内容を書き換えず、
///   更新時刻だけを現在時刻にする
/// - `retrieve` / `delete` / `last_modified` は存在しないキーに `StorageError::NotFound`
/// - `exists` / `status` は失敗しない（判定できなければ false）
/// - リトライはしない（呼び出し側の責務）
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 画像を保存する
    ///
    /// 書き込み（または touch）が完了したら `Ok(true)`。
    /// ストレージが書き込み不可なら `StorageError::StorageUnavailable`。
    async fn store(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        data: &[u8],
    ) -> Result<bool, StorageError>;

    /// 画像を削除する（空になったディレクトリは残す）
    async fn delete(&self, owner: &OwnerKey, image: &ImageIdentifier)
    -> Result<bool, StorageError>;

    /// 画像の全バイトを読み出す
    async fn retrieve(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<Vec<u8>, StorageError>;

    /// 最終更新時刻（UTC、秒精度）
    async fn last_modified(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<DateTime<Utc>, StorageError>;

    async fn exists(&self, owner: &OwnerKey, image: &ImageIdentifier) -> bool;

    /// ヘルスチェック用: 現在書き込み可能か
    async fn status(&self) -> bool;
}
