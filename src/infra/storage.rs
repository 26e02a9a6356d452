//! Filesystem-backed artifact storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{ArtifactStore, ArtifactStoreError, StoredArtifact};

/// Stores artifacts as plain files under a root directory.
///
/// Writes land in a temporary sibling first and are renamed into place, so a
/// reader never observes a partially written artifact.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open storage rooted at `root`, creating the directory if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, ArtifactStoreError> {
        let relative = Path::new(reference);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if reference.is_empty() || relative.is_absolute() || escapes {
            return Err(ArtifactStoreError::InvalidReference(reference.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<StoredArtifact, ArtifactStoreError> {
        if data.is_empty() {
            return Err(ArtifactStoreError::EmptyPayload);
        }
        let absolute = self.resolve(name)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let staging = absolute.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written: std::io::Result<()> = async {
            let mut file = fs::File::create(&staging).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&staging, &absolute).await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        let checksum = hex::encode(Sha256::digest(&data).as_slice());
        debug!(reference = name, size_bytes = data.len(), "Artifact stored");

        Ok(StoredArtifact {
            reference: name.to_string(),
            checksum,
            size_bytes: data.len() as u64,
        })
    }

    async fn get(&self, reference: &str) -> Result<Option<Bytes>, ArtifactStoreError> {
        let absolute = self.resolve(reference)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
