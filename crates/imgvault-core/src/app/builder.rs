//! StorageBuilder - 設定から BlobStore ドライバを構築
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - trait object によるドライバの切り替え

use std::sync::Arc;

use crate::config::{FilesystemConfig, StorageConfig};
use crate::impls::{FilesystemBlobStore, InMemoryBlobStore};
use crate::ports::BlobStore;

/// パーミッションとして許される最大値
const MAX_DIR_MODE: u32 = 0o777;

/// StorageBuilder は設定に応じた BlobStore を構築
///
/// # 使用例
/// ```ignore
/// let store = StorageBuilder::new(config.storage).build()?;
/// store.store(&owner, &image, &bytes).await?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に設定値を検証し、不正なら BuildError を返す
/// - 実行時（最初の store）まで設定ミスを持ち越さない
pub struct StorageBuilder {
    config: StorageConfig,
}

/// BuildError はストレージ構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("root_directory must not be empty")]
    EmptyRootDirectory,

    #[error("dir_mode {0:#o} is not a valid permission mode")]
    InvalidDirMode(u32),
}

impl StorageBuilder {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// ファイルシステムドライバを直接指定
    pub fn filesystem(config: FilesystemConfig) -> Self {
        Self::new(StorageConfig::Filesystem(config))
    }

    pub fn memory() -> Self {
        Self::new(StorageConfig::Memory)
    }

    pub fn build(self) -> Result<Arc<dyn BlobStore>, BuildError> {
        match self.config {
            StorageConfig::Filesystem(config) => {
                validate_filesystem(&config)?;
                Ok(Arc::new(FilesystemBlobStore::new(config)))
            }
            StorageConfig::Memory => Ok(Arc::new(InMemoryBlobStore::new())),
        }
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

fn validate_filesystem(config: &FilesystemConfig) -> Result<(), BuildError> {
    if config.root_directory.as_os_str().is_empty() {
        return Err(BuildError::EmptyRootDirectory);
    }
    if config.dir_mode > MAX_DIR_MODE {
        return Err(BuildError::InvalidDirMode(config.dir_mode));
    }
    Ok(())
}
