//! Storage keys (strongly-typed owner key / image identifier).
//!
//! 画像は「所有者キー」と「画像 ID」の 2 段のキーで指定します。
//! どちらも先頭 3 文字がディレクトリのシャードに使われるため、
//! 構築時に長さと文字種を検証し、検証済みの値だけがストレージ層に届くようにしています。
//!
//! ## Phantom Type パターン
//! `Key<T>` というジェネリック型で検証・シャード抽出の共通実装を提供しつつ、
//! `T` は実行時には使わない（PhantomData）マーカー型として、
//! OwnerKey と ImageIdentifier の取り違えをコンパイル時に防ぎます。

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

/// シャードに使う先頭文字数
pub const SHARD_DEPTH: usize = 3;

/// KeyMarker は各キー型のマーカー trait
///
/// エラーメッセージで使うラベル（"owner key", "image identifier"）を提供します。
pub trait KeyMarker: Send + Sync + 'static {
    fn label() -> &'static str;
}

/// KeyError はキー検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("{label} must be at least 3 characters long, got {len}")]
    TooShort { label: &'static str, len: usize },

    #[error("{label} contains a forbidden character {ch:?}")]
    InvalidCharacter { label: &'static str, ch: char },
}

impl KeyError {
    /// HTTP 相当のステータスコード（常に 400）
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// 検証済みのストレージキー
///
/// 先頭 3 文字（Unicode scalar 単位）を `shard` として保持するので、
/// パス導出時に範囲外アクセスは起こりません。
///
/// # 例
/// ```ignore
/// let owner = OwnerKey::parse("abc123")?;
/// assert_eq!(owner.shard(), ['a', 'b', 'c']);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key<T: KeyMarker> {
    value: String,
    shard: [char; SHARD_DEPTH],
    _marker: PhantomData<T>,
}

impl<T: KeyMarker> Key<T> {
    /// 文字列を検証して Key を作成
    ///
    /// # 検証
    /// - 3 文字未満は `KeyError::TooShort`
    /// - パス区切り（`/`, `\`）や NUL を含む場合は `KeyError::InvalidCharacter`
    pub fn parse(value: impl Into<String>) -> Result<Self, KeyError> {
        let value = value.into();

        if let Some(ch) = value.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(KeyError::InvalidCharacter {
                label: T::label(),
                ch,
            });
        }

        let mut chars = value.chars();
        let (Some(a), Some(b), Some(c)) = (chars.next(), chars.next(), chars.next()) else {
            return Err(KeyError::TooShort {
                label: T::label(),
                len: value.chars().count(),
            });
        };

        Ok(Self {
            shard: [a, b, c],
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// シャードに使う先頭 3 文字
    pub fn shard(&self) -> [char; SHARD_DEPTH] {
        self.shard
    }
}

impl<T: KeyMarker> AsRef<str> for Key<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T: KeyMarker> TryFrom<&str> for Key<T> {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl<T: KeyMarker> std::str::FromStr for Key<T> {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<T: KeyMarker> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// 所有者（ユーザー / テナント）のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {}

impl KeyMarker for Owner {
    fn label() -> &'static str {
        "owner key"
    }
}

/// 画像のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Image {}

impl KeyMarker for Image {
    fn label() -> &'static str {
        "image identifier"
    }
}

/// Key scoping every stored image to a tenant.
pub type OwnerKey = Key<Owner>;

/// Identifier of a single image; also the stored file name.
pub type ImageIdentifier = Key<Image>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_keeps_value_and_shard() {
        let owner = OwnerKey::parse("abc123").unwrap();
        assert_eq!(owner.as_str(), "abc123");
        assert_eq!(owner.shard(), ['a', 'b', 'c']);
        assert_eq!(owner.to_string(), "abc123");
    }

    #[test]
    fn exactly_three_characters_is_accepted() {
        let image = ImageIdentifier::parse("xyz").unwrap();
        assert_eq!(image.shard(), ['x', 'y', 'z']);
    }

    #[rstest]
    #[case::empty("", 0)]
    #[case::one("a", 1)]
    #[case::two("ab", 2)]
    #[case::two_multibyte("画像", 2)]
    fn short_keys_are_rejected(#[case] input: &str, #[case] len: usize) {
        let err = OwnerKey::parse(input).unwrap_err();
        assert_eq!(
            err,
            KeyError::TooShort {
                label: "owner key",
                len
            }
        );
        assert_eq!(err.status_code(), 400);
    }

    #[rstest]
    #[case::slash("ab/cd", '/')]
    #[case::backslash("ab\\cd", '\\')]
    #[case::nul("abc\0", '\0')]
    #[case::traversal("../etc", '/')]
    fn path_characters_are_rejected(#[case] input: &str, #[case] ch: char) {
        let err = ImageIdentifier::parse(input).unwrap_err();
        assert_eq!(
            err,
            KeyError::InvalidCharacter {
                label: "image identifier",
                ch
            }
        );
    }

    #[test]
    fn shard_counts_characters_not_bytes() {
        let owner = OwnerKey::parse("画像キー").unwrap();
        assert_eq!(owner.shard(), ['画', '像', 'キ']);
    }

    #[test]
    fn from_str_and_try_from_validate() {
        let owner: OwnerKey = "tenant".parse().unwrap();
        assert_eq!(owner.as_str(), "tenant");
        assert!(ImageIdentifier::try_from("no").is_err());
    }

    #[test]
    fn error_message_names_the_key() {
        let err = ImageIdentifier::parse("ab").unwrap_err();
        assert_eq!(
            err.to_string(),
            "image identifier must be at least 3 characters long, got 2"
        );
    }
}
