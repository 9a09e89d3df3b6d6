//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FilesystemBlobStore**: 本番用。シャード化したディレクトリに画像を保存
//! - **ShardLayout**: FilesystemBlobStore のパス導出
//! - **InMemoryBlobStore**: 開発・テスト用の BlobStore
//! - **InMemoryMetadataStore**: 開発・テスト用の MetadataStore
//!
//! ドキュメント DB の MetadataStore 実装は別クレートに配置します。

pub mod fs_blob;
pub mod inmem_metadata;
pub mod layout;
pub mod memory_blob;

// 主要な型を再エクスポート
pub use self::fs_blob::FilesystemBlobStore;
pub use self::inmem_metadata::InMemoryMetadataStore;
pub use self::layout::ShardLayout;
pub use self::memory_blob::InMemoryBlobStore;
