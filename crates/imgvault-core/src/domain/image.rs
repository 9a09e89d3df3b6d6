//! Image metadata records kept by the metadata store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 画像 1 枚分のメタデータ（呼び出し側が渡す部分）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub size: u64,
    pub mime_type: String,
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub checksum: String,
}

/// MetadataStore が保持するレコード
///
/// `added` は初回 insert 時刻、`updated` は最後の insert / update 時刻。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(flatten)]
    pub metadata: ImageMetadata,
    pub added: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(metadata: ImageMetadata, now: DateTime<Utc>) -> Self {
        Self {
            metadata,
            added: now,
            updated: now,
        }
    }

    /// メタデータを差し替えて `updated` を進める（`added` は維持）
    pub fn replace(&mut self, metadata: ImageMetadata, now: DateTime<Utc>) {
        self.metadata = metadata;
        self.updated = now;
    }
}
