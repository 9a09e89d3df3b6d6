//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ファイルシステム、ドキュメント DB など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - Blob storage は画像の生データの保存先
//! - MetadataStore は画像ごとのレコードの正本
//! - 時刻は Clock 経由で注入

pub mod blob_store;
pub mod clock;
pub mod metadata_store;

// 主要な trait を再エクスポート
pub use self::blob_store::BlobStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::metadata_store::MetadataStore;
