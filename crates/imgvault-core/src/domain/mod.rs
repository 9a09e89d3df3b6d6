//! Domain model (keys, image records, errors).

pub mod errors;
pub mod image;
pub mod keys;

pub use self::errors::{ErrorKind, StorageError};
pub use self::image::{ImageMetadata, ImageRecord};
pub use self::keys::{ImageIdentifier, Key, KeyError, KeyMarker, OwnerKey, SHARD_DEPTH};
