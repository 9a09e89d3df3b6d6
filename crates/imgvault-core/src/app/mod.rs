//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて上位層が使う入口を提供します。
//!
//! # 主要コンポーネント
//! - **StorageBuilder**: 設定からの BlobStore ドライバの構築と検証
//! - **StatusReport**: MetadataStore / BlobStore のヘルスチェック

pub mod builder;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, StorageBuilder};
pub use self::status::StatusReport;
