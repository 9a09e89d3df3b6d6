//! imgvault-core
//!
//! 画像ホスティング向けのストレージ層。所有者キーと画像 ID で指定した画像を
//! シャード化したディレクトリ構成でファイルシステムに保存します。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（keys, image, errors）
//! - **ports**: 抽象化レイヤー（BlobStore, MetadataStore, Clock）
//! - **impls**: 実装（FilesystemBlobStore, ShardLayout, InMemory 系）
//! - **app**: アプリケーション層（StorageBuilder, StatusReport）
//! - **config**: 設定の型

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use crate::app::{BuildError, StatusReport, StorageBuilder};
pub use crate::config::{Config, FilesystemConfig, StorageConfig};
pub use crate::domain::{ImageIdentifier, KeyError, OwnerKey, StorageError};
pub use crate::ports::{BlobStore, MetadataStore};
