//! Status - ヘルスチェック
//!
//! MetadataStore と BlobStore の `status()` をまとめて 1 つのレポートにします。
//! どちらかが落ちていれば unhealthy（503 相当）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{BlobStore, Clock, MetadataStore};

/// StatusReport はストレージ層の稼働状況
///
/// # 使用例
/// ```ignore
/// let report = StatusReport::collect(&*database, &*storage, &SystemClock).await;
/// println!("{}", serde_json::to_string(&report)?);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub date: DateTime<Utc>,
    pub database: bool,
    pub storage: bool,
}

impl StatusReport {
    pub async fn collect(
        database: &dyn MetadataStore,
        storage: &dyn BlobStore,
        clock: &dyn Clock,
    ) -> Self {
        let (database, storage) = tokio::join!(database.status(), storage.status());
        Self {
            date: clock.now(),
            database,
            storage,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.database && self.storage
    }

    /// HTTP 相当のステータスコード
    pub fn status_code(&self) -> u16 {
        if self.is_healthy() { 200 } else { 503 }
    }
}
