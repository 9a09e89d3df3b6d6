//! ShardLayout - (OwnerKey, ImageIdentifier) からファイルパスを導出
//!
//! ```text
//! <root>/<o0>/<o1>/<o2>/<owner>/<i0>/<i1>/<i2>/<image>
//! ```
//!
//! 1 ディレクトリあたりのエントリ数を抑えるため、所有者キーと画像 ID の
//! 先頭 3 文字をそれぞれ 1 文字ずつのディレクトリにします。
//! 乱数も衝突解決もない純粋関数です。

use std::path::{Path, PathBuf};

use crate::domain::{ImageIdentifier, Key, KeyMarker, OwnerKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    root: PathBuf,
}

impl ShardLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 画像ファイルを置くディレクトリ（ファイル名を含まない）
    pub fn image_dir(&self, owner: &OwnerKey, image: &ImageIdentifier) -> PathBuf {
        let mut path = self.root.clone();
        push_shard(&mut path, owner);
        path.push(owner.as_str());
        push_shard(&mut path, image);
        path
    }

    /// 画像ファイルのフルパス
    pub fn image_path(&self, owner: &OwnerKey, image: &ImageIdentifier) -> PathBuf {
        let mut path = self.image_dir(owner, image);
        path.push(image.as_str());
        path
    }
}

fn push_shard<T: KeyMarker>(path: &mut PathBuf, key: &Key<T>) {
    let mut buf = [0u8; 4];
    for ch in key.shard() {
        path.push(&*ch.encode_utf8(&mut buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(owner: &str, image: &str) -> (OwnerKey, ImageIdentifier) {
        (
            OwnerKey::parse(owner).unwrap(),
            ImageIdentifier::parse(image).unwrap(),
        )
    }

    #[test]
    fn image_path_matches_documented_layout() {
        let layout = ShardLayout::new("/data");
        let (owner, image) = keys("abc123", "def456");

        assert_eq!(
            layout.image_path(&owner, &image),
            PathBuf::from("/data/a/b/c/abc123/d/e/f/def456")
        );
    }

    #[test]
    fn image_dir_omits_file_name() {
        let layout = ShardLayout::new("/data");
        let (owner, image) = keys("abc123", "def456");

        assert_eq!(
            layout.image_dir(&owner, &image),
            PathBuf::from("/data/a/b/c/abc123/d/e/f")
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let layout = ShardLayout::new("/srv/images");
        let (owner, image) = keys("publickey", "929db9c5fc3099f7576f5655207eba47");

        let first = layout.image_path(&owner, &image);
        let second = layout.image_path(&owner, &image);
        assert_eq!(first, second);
        assert_eq!(
            first,
            PathBuf::from("/srv/images/p/u/b/publickey/9/2/9/929db9c5fc3099f7576f5655207eba47")
        );
    }

    #[test]
    fn multibyte_shards_are_single_segments() {
        let layout = ShardLayout::new("/data");
        let (owner, image) = keys("画像キー", "xyz");

        assert_eq!(
            layout.image_path(&owner, &image),
            PathBuf::from("/data/画/像/キ/画像キー/x/y/z/xyz")
        );
    }

    #[test]
    fn owners_sharing_a_prefix_share_the_shard_but_not_the_file() {
        let layout = ShardLayout::new("/data");
        let (a, image) = keys("abc123", "def456");
        let (b, _) = keys("abc124", "def456");

        assert_ne!(layout.image_path(&a, &image), layout.image_path(&b, &image));
        assert!(layout.image_path(&a, &image).starts_with("/data/a/b/c"));
        assert!(layout.image_path(&b, &image).starts_with("/data/a/b/c"));
    }
}
