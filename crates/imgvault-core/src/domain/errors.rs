//! Errors - ストレージ操作のエラー型と分類
//!
//! 上位層（画像サーバー）はこの分類と `status_code()` を見て
//! プロトコルレベルのレスポンスに変換します。

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::keys::{ImageIdentifier, OwnerKey};

/// ErrorKind はストレージエラーの運用分類
///
/// - NotFound: 対象が存在しない（リトライ無意味）
/// - Unavailable: ストレージが書き込み不可（リクエスト単位で致命的）
/// - Infrastructure: 想定外の I/O 障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unavailable,
    Infrastructure,
}

/// StorageError は BlobStore / MetadataStore 共通のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not store image: {location} is not writable")]
    StorageUnavailable { location: String },

    #[error("image not found: {owner}/{image}")]
    NotFound { owner: String, image: String },

    #[error("i/o failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn unavailable(location: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            location: location.into(),
        }
    }

    pub fn not_found(owner: &OwnerKey, image: &ImageIdentifier) -> Self {
        Self::NotFound {
            owner: owner.to_string(),
            image: image.to_string(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StorageUnavailable { .. } => ErrorKind::Unavailable,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { .. } => ErrorKind::Infrastructure,
        }
    }

    /// HTTP 相当のステータスコード
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Unavailable | ErrorKind::Infrastructure => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let owner = OwnerKey::parse("abc123").unwrap();
        let image = ImageIdentifier::parse("def456").unwrap();
        let err = StorageError::not_found(&owner, &image);

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "image not found: abc123/def456");
    }

    #[test]
    fn unavailable_maps_to_500() {
        let err = StorageError::unavailable("/data");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_not_found());
    }

    #[test]
    fn io_keeps_its_source() {
        let source = std::io::Error::other("disk on fire");
        let err = StorageError::io(Path::new("/data/a"), source);

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(err.status_code(), 500);
        assert!(std::error::Error::source(&err).is_some());
    }
}
