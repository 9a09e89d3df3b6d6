//! Configuration records.
//!
//! 設定は名前付きフィールドの struct で表し、既定値は serde の `default` で与えます。
//! ファイルや環境変数のマージは CLI 側（figment）で行い、ここでは型だけを定義します。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// シャードディレクトリの既定パーミッション（owner/group: rwx, others: r-x）
pub const DEFAULT_DIR_MODE: u32 = 0o775;

/// 既定のルートディレクトリ（カレントディレクトリからの相対パス）
pub const DEFAULT_ROOT_DIRECTORY: &str = "imgvault_storage/images";

fn default_dir_mode() -> u32 {
    DEFAULT_DIR_MODE
}

/// FilesystemBlobStore の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    /// すべてのシャードを作成するベースディレクトリ。プロセスから書き込み可能であること。
    pub root_directory: PathBuf,

    /// 作成したシャードディレクトリに付与するモード（Unix のみ有効）
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
}

impl FilesystemConfig {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    pub fn with_dir_mode(mut self, dir_mode: u32) -> Self {
        self.dir_mode = dir_mode;
        self
    }
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_DIRECTORY)
    }
}

/// BlobStore ドライバの選択
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum StorageConfig {
    Filesystem(FilesystemConfig),
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem(FilesystemConfig::default())
    }
}

/// アプリケーション全体の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_driver_with_default_mode() {
        let config: Config = serde_json::from_str(
            r#"{ "storage": { "driver": "filesystem", "root_directory": "/data" } }"#,
        )
        .unwrap();

        assert_eq!(
            config.storage,
            StorageConfig::Filesystem(FilesystemConfig {
                root_directory: PathBuf::from("/data"),
                dir_mode: 0o775,
            })
        );
    }

    #[test]
    fn explicit_dir_mode_overrides_default() {
        let config: StorageConfig = serde_json::from_str(
            r#"{ "driver": "filesystem", "root_directory": "/data", "dir_mode": 488 }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            StorageConfig::Filesystem(FilesystemConfig::new("/data").with_dir_mode(0o750))
        );
    }

    #[test]
    fn memory_driver() {
        let config: StorageConfig = serde_json::from_str(r#"{ "driver": "memory" }"#).unwrap();
        assert_eq!(config, StorageConfig::Memory);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Filesystem(FilesystemConfig::new(DEFAULT_ROOT_DIRECTORY))
        );
    }

    #[test]
    fn unknown_driver_is_rejected() {
        let result = serde_json::from_str::<StorageConfig>(r#"{ "driver": "s3" }"#);
        assert!(result.is_err());
    }
}
