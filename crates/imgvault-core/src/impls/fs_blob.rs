//! FilesystemBlobStore - ローカルファイルシステム上の BlobStore
//!
//! # 配置
//! ShardLayout が導出した `<root>/o/w/n/<owner>/i/m/g/<image>` に 1 画像 1 ファイルで保存します。
//! ディレクトリは最初の store 時に必要な分だけ作成し、削除はしません。
//!
//! # 並行性
//! - 状態は設定と Clock のみ（キャッシュなし、ファイルシステムが正本）
//! - 同じシャードへの同時 store でディレクトリ作成が競合しても、
//!   `AlreadyExists` は成功として扱う
//! - tokio::fs にない同期処理（mtime の設定、書き込み可否の確認、一時ファイルへの書き込み）は
//!   spawn_blocking で実行
//!
//! # 書き込み
//! 新しい画像はシャードディレクトリ内の一時ファイルに書き切ってから rename します。
//! 途中で失敗しても画像パスに中途半端なファイルは残りません。

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::FilesystemConfig;
use crate::domain::{ImageIdentifier, OwnerKey, StorageError};
use crate::impls::layout::ShardLayout;
use crate::ports::{BlobStore, Clock, SystemClock};

/// 書き込み可否の確認に使う一時ファイルのプレフィックス
const PROBE_PREFIX: &str = ".imgvault-probe-";

/// 書き込み途中の画像ファイルのプレフィックス
const PARTIAL_PREFIX: &str = ".imgvault-partial-";

/// 画像ファイルの mode
const FILE_MODE: u32 = 0o644;

/// FilesystemBlobStore はローカルディスクに画像を保存する BlobStore
///
/// # 使用例
/// ```ignore
/// let store = FilesystemBlobStore::new(FilesystemConfig::new("/var/lib/imgvault"));
/// store.store(&owner, &image, &bytes).await?;
/// let bytes = store.retrieve(&owner, &image).await?;
/// ```
pub struct FilesystemBlobStore<C = SystemClock> {
    layout: ShardLayout,
    dir_mode: u32,
    clock: C,
}

impl FilesystemBlobStore<SystemClock> {
    pub fn new(config: FilesystemConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> FilesystemBlobStore<C> {
    /// Clock を差し替えて作成（テスト用）
    pub fn with_clock(config: FilesystemConfig, clock: C) -> Self {
        Self {
            layout: ShardLayout::new(config.root_directory),
            dir_mode: config.dir_mode,
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// 画像ファイルのフルパス（存在するとは限らない）
    pub fn image_path(&self, owner: &OwnerKey, image: &ImageIdentifier) -> PathBuf {
        self.layout.image_path(owner, image)
    }

    async fn is_writable(&self) -> bool {
        let root = self.layout.root().to_path_buf();
        tokio::task::spawn_blocking(move || probe_writable(&root))
            .await
            .unwrap_or(false)
    }

    /// 内容を変えずに mtime を Clock の現在時刻にする
    ///
    /// 読み取り専用で開くので、所有者であれば書き込み権のないファイルにも使えます。
    async fn touch(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        let mtime = SystemTime::from(self.clock.now());
        tokio::task::spawn_blocking(move || std::fs::File::open(&path)?.set_modified(mtime))
            .await
            .map_err(io::Error::other)?
    }

    /// dir 内の一時ファイルに data を書き切り、mtime を付けてから path へ rename
    ///
    /// どこで失敗しても一時ファイルは drop 時に削除されます。
    async fn write_atomically(&self, dir: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = dir.to_path_buf();
        let path = path.to_path_buf();
        let data = data.to_vec();
        let mtime = SystemTime::from(self.clock.now());
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut partial = tempfile::Builder::new()
                .prefix(PARTIAL_PREFIX)
                .tempfile_in(&dir)?;
            partial.write_all(&data)?;
            partial.as_file().sync_all()?;
            set_file_mode(partial.as_file(), FILE_MODE)?;
            partial.as_file().set_modified(mtime)?;
            partial.persist(&path).map_err(|error| error.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }
}

#[async_trait]
impl<C: Clock + 'static> BlobStore for FilesystemBlobStore<C> {
    #[tracing::instrument(skip_all, fields(owner = %owner, image = %image, size = data.len()))]
    async fn store(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
        data: &[u8],
    ) -> Result<bool, StorageError> {
        if !self.is_writable().await {
            warn!(root = %self.root().display(), "storage root is not writable");
            return Err(StorageError::unavailable(self.root().display().to_string()));
        }

        let path = self.layout.image_path(owner, image);

        // 既存の画像は書き換えず touch のみ
        if is_file(&path).await {
            debug!("image already stored, refreshing modification time");
            return Ok(match self.touch(&path).await {
                Ok(()) => true,
                Err(error) => {
                    warn!(%error, "failed to refresh modification time");
                    false
                }
            });
        }

        let dir = self.layout.image_dir(owner, image);
        if let Err(error) = create_shard_dirs(self.root(), &dir, self.dir_mode).await {
            warn!(%error, dir = %dir.display(), "failed to create shard directories");
            return Ok(false);
        }

        if let Err(error) = self.write_atomically(&dir, &path, data).await {
            warn!(%error, path = %path.display(), "failed to write image");
            return Ok(false);
        }

        Ok(true)
    }

    #[tracing::instrument(skip_all, fields(owner = %owner, image = %image))]
    async fn delete(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<bool, StorageError> {
        let path = self.layout.image_path(owner, image);
        if !is_file(&path).await {
            return Err(StorageError::not_found(owner, image));
        }

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(owner, image))
            }
            Err(error) => {
                warn!(%error, path = %path.display(), "failed to remove image");
                Ok(false)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(owner = %owner, image = %image))]
    async fn retrieve(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<Vec<u8>, StorageError> {
        let path = self.layout.image_path(owner, image);
        if !is_file(&path).await {
            return Err(StorageError::not_found(owner, image));
        }

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(owner, image))
            }
            Err(error) => Err(StorageError::io(&path, error)),
        }
    }

    #[tracing::instrument(skip_all, fields(owner = %owner, image = %image))]
    async fn last_modified(
        &self,
        owner: &OwnerKey,
        image: &ImageIdentifier,
    ) -> Result<DateTime<Utc>, StorageError> {
        let path = self.layout.image_path(owner, image);
        if !is_file(&path).await {
            return Err(StorageError::not_found(owner, image));
        }

        let modified = fs::metadata(&path)
            .await
            .and_then(|metadata| metadata.modified())
            .map_err(|error| match error.kind() {
                io::ErrorKind::NotFound => StorageError::not_found(owner, image),
                _ => StorageError::io(&path, error),
            })?;

        Ok(DateTime::<Utc>::from(modified).trunc_subsecs(0))
    }

    #[tracing::instrument(skip_all, fields(owner = %owner, image = %image))]
    async fn exists(&self, owner: &OwnerKey, image: &ImageIdentifier) -> bool {
        is_file(&self.layout.image_path(owner, image)).await
    }

    #[tracing::instrument(skip_all, fields(root = %self.root().display()))]
    async fn status(&self) -> bool {
        self.is_writable().await
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// root がディレクトリで、実際にファイルを作成できるか
fn probe_writable(root: &Path) -> bool {
    if !std::fs::metadata(root).is_ok_and(|m| m.is_dir()) {
        return false;
    }
    tempfile::Builder::new()
        .prefix(PROBE_PREFIX)
        .tempfile_in(root)
        .is_ok()
}

/// root から dir まで 1 段ずつ作成し、新しく作ったディレクトリにだけ mode を付与
///
/// umask を変更せずに mode を確定させるため、作成後に明示的に set_permissions します。
/// 他の store と競合して `AlreadyExists` になった段はそのまま次へ進みます。
async fn create_shard_dirs(root: &Path, dir: &Path, mode: u32) -> io::Result<()> {
    if fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
        return Ok(());
    }

    let relative = dir.strip_prefix(root).map_err(io::Error::other)?;
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::create_dir(&current).await {
            Ok(()) => {
                debug!(dir = %current.display(), "created shard directory");
                set_dir_mode(&current, mode).await?;
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn set_dir_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_dir_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(file: &std::fs::File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_file: &std::fs::File, _mode: u32) -> io::Result<()> {
    Ok(())
}
