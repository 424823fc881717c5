//! Avatar blob storage.
//!
//! Only the boundary lives here: uploads are checked for size and format, then
//! handed to an `AvatarStorage`, which reports where the three sizes live.
//! Resizing is left to whatever sits behind the storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::AvatarSet;

pub const MAX_AVATAR_BYTES: usize = 1024 * 1024;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }
}

/// Checks an upload before it reaches storage.
pub fn validate_image(bytes: &[u8]) -> Result<ImageKind, AppError> {
    if bytes.is_empty() {
        return Err(AppError::ValidationError("Please upload an image".into()));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::ValidationError(
            "Avatar must be smaller than 1 MiB".into(),
        ));
    }
    if bytes.starts_with(PNG_MAGIC) {
        Ok(ImageKind::Png)
    } else if bytes.starts_with(JPEG_MAGIC) {
        Ok(ImageKind::Jpeg)
    } else {
        Err(AppError::ValidationError(
            "Avatar must be a PNG or JPEG image".into(),
        ))
    }
}

#[async_trait]
pub trait AvatarStorage: Send + Sync {
    async fn save(&self, user_id: Uuid, kind: ImageKind, image: &[u8])
        -> Result<AvatarSet, AppError>;

    /// Removing an avatar that was never stored is not an error.
    async fn remove(&self, user_id: Uuid) -> Result<(), AppError>;
}

/// Writes avatars below `root/<user id>/`.
#[derive(Debug, Clone)]
pub struct DiskAvatarStorage {
    root: PathBuf,
}

impl DiskAvatarStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: Uuid) -> PathBuf {
        self.root.join(user_id.to_string())
    }
}

fn io_error(error: std::io::Error) -> AppError {
    AppError::InternalServerError(format!("Avatar storage failed: {}", error))
}

async fn remove_file_if_present(path: PathBuf) -> Result<(), AppError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error(e)),
    }
}

#[async_trait]
impl AvatarStorage for DiskAvatarStorage {
    async fn save(
        &self,
        user_id: Uuid,
        kind: ImageKind,
        image: &[u8],
    ) -> Result<AvatarSet, AppError> {
        let dir = self.user_dir(user_id);
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;

        let write = |size: &'static str| {
            let path = dir.join(format!("{}.{}", size, kind.extension()));
            async move {
                tokio::fs::write(&path, image).await.map_err(io_error)?;
                Ok::<_, AppError>(path.to_string_lossy().into_owned())
            }
        };

        let set = AvatarSet {
            small: write("small").await?,
            medium: write("medium").await?,
            large: write("large").await?,
        };

        // Files of a previous upload in the other format are dropped only once
        // the new set is complete.
        for stale in [ImageKind::Png, ImageKind::Jpeg] {
            if stale == kind {
                continue;
            }
            for size in ["small", "medium", "large"] {
                let path = dir.join(format!("{}.{}", size, stale.extension()));
                remove_file_if_present(path).await?;
            }
        }

        Ok(set)
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), AppError> {
        match tokio::fs::remove_dir_all(self.user_dir(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryAvatarStorage {
    images: RwLock<HashMap<Uuid, Vec<u8>>>,
}

impl MemoryAvatarStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, user_id: Uuid) -> bool {
        self.images.read().await.contains_key(&user_id)
    }
}

#[async_trait]
impl AvatarStorage for MemoryAvatarStorage {
    async fn save(
        &self,
        user_id: Uuid,
        kind: ImageKind,
        image: &[u8],
    ) -> Result<AvatarSet, AppError> {
        self.images.write().await.insert(user_id, image.to_vec());
        let location = |size: &str| {
            format!("memory://avatars/{}/{}.{}", user_id, size, kind.extension())
        };
        Ok(AvatarSet {
            small: location("small"),
            medium: location("medium"),
            large: location("large"),
        })
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), AppError> {
        self.images.write().await.remove(&user_id);
        Ok(())
    }
}
