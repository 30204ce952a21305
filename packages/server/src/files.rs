//! File Store: FileRecord rows plus their blobs in the public directory.
//!
//! Every operation takes the connection it should persist through, so a
//! handler can run an upload and the owner update in one transaction. Blob
//! side effects of that transaction are tracked in a [`BlobChanges`]: new
//! blobs are written immediately, old ones are only queued and are removed by
//! [`FileStore::sweep`] once the database commit has succeeded.

use std::sync::Arc;

use axum::body::Bytes;
use common::storage::{PublicStore, extension_of, generate_name};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{file, history, product, user};
use crate::error::AppError;

/// One uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

/// Blob written to the public directory, before any row points at it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub path: String,
    pub original_name: String,
    pub size: i64,
    pub format: String,
}

/// Blob writes and pending removals belonging to one database transaction.
///
/// Dropped without [`FileStore::sweep`], the transaction is assumed rolled
/// back: queued blobs stay on disk for the restored rows, and blobs written
/// so far are logged as orphaned.
#[derive(Debug, Default)]
#[must_use = "pass to FileStore::sweep after the transaction commits"]
pub struct BlobChanges {
    written: Vec<String>,
    stale: Vec<String>,
    settled: bool,
}

impl BlobChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a blob for removal after commit.
    pub fn remove_later(&mut self, path: impl Into<String>) {
        self.stale.push(path.into());
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn stale(&self) -> &[String] {
        &self.stale
    }
}

impl Drop for BlobChanges {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        for path in &self.written {
            warn!(path = %path, "Orphaned upload: transaction did not commit");
        }
    }
}

/// An entity that owns at most one FileRecord through `file_id`.
pub trait OwnsFile {
    fn current_file_id(&self) -> Option<i32>;
    fn set_file_id(&mut self, id: Option<i32>);
}

macro_rules! impl_owns_file {
    ($($entity:ident),+ $(,)?) => {$(
        impl OwnsFile for $entity::ActiveModel {
            fn current_file_id(&self) -> Option<i32> {
                match &self.file_id {
                    ActiveValue::Set(id) | ActiveValue::Unchanged(id) => *id,
                    ActiveValue::NotSet => None,
                }
            }

            fn set_file_id(&mut self, id: Option<i32>) {
                self.file_id = Set(id);
            }
        }
    )+};
}

impl_owns_file!(product, user, history);

#[derive(Clone)]
pub struct FileStore {
    blobs: Arc<dyn PublicStore>,
    url_prefix: Arc<str>,
}

impl FileStore {
    pub fn new(blobs: Arc<dyn PublicStore>, url_prefix: &str) -> Self {
        Self {
            blobs,
            url_prefix: Arc::from(url_prefix.trim_end_matches('/')),
        }
    }

    /// Public path for a stored blob name.
    pub fn path_for(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix, name)
    }

    fn blob_name<'a>(&self, path: &'a str) -> Result<&'a str, AppError> {
        path.strip_prefix(&*self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| AppError::Storage(format!("{path} is not a public file path")))
    }

    /// Whether the blob behind a public path is present.
    pub async fn blob_exists(&self, path: &str) -> Result<bool, AppError> {
        let name = self.blob_name(path)?;
        Ok(self.blobs.exists(name).await?)
    }

    /// Write an upload under a fresh collision-free name.
    pub async fn write_blob(
        &self,
        upload: &Upload,
        changes: &mut BlobChanges,
    ) -> Result<StoredBlob, AppError> {
        let name = generate_name(&upload.file_name);
        let size = self.blobs.put(&name, &upload.data).await?;
        let blob = StoredBlob {
            path: self.path_for(&name),
            original_name: upload.file_name.clone(),
            size: size as i64,
            format: extension_of(&upload.file_name),
        };
        changes.written.push(blob.path.clone());
        info!(path = %blob.path, size, "Stored upload");
        Ok(blob)
    }

    /// Remove the blob behind a public path now. A blob that is already gone
    /// is logged and treated as removed.
    async fn remove_blob(&self, path: &str) -> Result<(), AppError> {
        let name = self.blob_name(path)?;
        if self.blobs.delete(name).await? {
            info!(path, "Removed blob");
        } else {
            warn!(path, "Blob already missing from public directory");
        }
        Ok(())
    }

    /// Settle a committed transaction: remove every queued blob.
    ///
    /// The rows are already gone, so a failed removal only leaks the blob;
    /// it is logged and the remaining blobs are still removed.
    pub async fn sweep(&self, mut changes: BlobChanges) {
        changes.settled = true;
        for path in std::mem::take(&mut changes.stale) {
            if let Err(e) = self.remove_blob(&path).await {
                warn!(path = %path, error = ?e, "Stale blob could not be removed");
            }
        }
    }

    /// Store an upload and persist its FileRecord.
    pub async fn save<C: ConnectionTrait>(
        &self,
        db: &C,
        upload: &Upload,
        changes: &mut BlobChanges,
    ) -> Result<file::Model, AppError> {
        let blob = self.write_blob(upload, changes).await?;
        let now = chrono::Utc::now();
        let record = file::ActiveModel {
            path: Set(blob.path),
            file_name: Set(blob.original_name),
            size: Set(blob.size),
            format: Set(blob.format),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(record.insert(db).await?)
    }

    /// Save `upload`, then delete the old record's row and queue its blob.
    pub async fn replace<C: ConnectionTrait>(
        &self,
        db: &C,
        old_id: i32,
        upload: &Upload,
        changes: &mut BlobChanges,
    ) -> Result<file::Model, AppError> {
        let old = file::Entity::find_by_id(old_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))?;
        self.replace_record(db, old, upload, changes).await
    }

    async fn replace_record<C: ConnectionTrait>(
        &self,
        db: &C,
        old: file::Model,
        upload: &Upload,
        changes: &mut BlobChanges,
    ) -> Result<file::Model, AppError> {
        let new = self.save(db, upload, changes).await?;
        file::Entity::delete_by_id(old.id).exec(db).await?;
        changes.remove_later(old.path);
        Ok(new)
    }

    /// Delete a FileRecord's row and queue its blob.
    pub async fn delete<C: ConnectionTrait>(
        &self,
        db: &C,
        id: i32,
        changes: &mut BlobChanges,
    ) -> Result<(), AppError> {
        let record = file::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))?;
        file::Entity::delete_by_id(record.id).exec(db).await?;
        changes.remove_later(record.path);
        Ok(())
    }

    /// Give `owner` a new file, replacing the one it held.
    ///
    /// The owner is only modified in memory; the caller persists it in the
    /// same transaction.
    pub async fn attach<C, O>(
        &self,
        db: &C,
        owner: &mut O,
        upload: &Upload,
        changes: &mut BlobChanges,
    ) -> Result<file::Model, AppError>
    where
        C: ConnectionTrait,
        O: OwnsFile,
    {
        let previous = match owner.current_file_id() {
            Some(id) => file::Entity::find_by_id(id).one(db).await?,
            None => None,
        };
        let record = match previous {
            Some(old) => self.replace_record(db, old, upload, changes).await?,
            None => self.save(db, upload, changes).await?,
        };
        owner.set_file_id(Some(record.id));
        Ok(record)
    }

    /// Delete the file `owner` holds, if any, and clear the reference.
    pub async fn release<C, O>(
        &self,
        db: &C,
        owner: &mut O,
        changes: &mut BlobChanges,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait,
        O: OwnsFile,
    {
        if let Some(id) = owner.current_file_id() {
            match self.delete(db, id, changes).await {
                Ok(()) | Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            owner.set_file_id(None);
        }
        Ok(())
    }
}
