use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    errors::ArchiveResult,
    models::{ByteStream, DownloadedFile, DrainReport, MigrationReport, ObjectDownload},
    value_objects::{BucketName, ObjectName},
};

/// Port for the archive file store: bucket and file lifecycle keyed by an
/// archive identifier (one bucket per archived work).
///
/// Every identifier is normalized into a bucket name before it reaches the
/// store, so callers may pass raw catalog numbers or already normalized names.
#[async_trait]
pub trait ArchiveService: Send + Sync + 'static {
    /// Check whether the archive's bucket exists
    async fn bucket_exists(&self, archive_id: &str) -> ArchiveResult<bool>;

    /// Create the archive's bucket; `BucketAlreadyExists` if present
    async fn create_bucket(&self, archive_id: &str) -> ArchiveResult<BucketName>;

    /// Drain and remove the archive's bucket; `BucketNotFound` if absent
    async fn delete_bucket(&self, archive_id: &str) -> ArchiveResult<DrainReport>;

    /// Store a file, replacing any existing file of the same name
    async fn upload_file(
        &self,
        archive_id: &str,
        file_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> ArchiveResult<()>;

    /// Store a file read from a stream, replacing any existing file of the
    /// same name; returns the stored size
    async fn upload_stream(
        &self,
        archive_id: &str,
        file_name: &str,
        content: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64>;

    /// Read a whole file into memory; `FileNotFound` if absent
    async fn download_file(&self, archive_id: &str, file_name: &str)
        -> ArchiveResult<DownloadedFile>;

    /// Open a file as a stream for large payloads; `FileNotFound` if absent
    async fn download_stream(
        &self,
        archive_id: &str,
        file_name: &str,
    ) -> ArchiveResult<ObjectDownload>;

    /// Names of the files in the archive's bucket, in store order
    async fn list_files(&self, archive_id: &str) -> ArchiveResult<Vec<ObjectName>>;

    /// Delete one file; `FileNotFound` if absent
    async fn delete_file(&self, archive_id: &str, file_name: &str) -> ArchiveResult<()>;

    /// Server-side copy between archives; a no-op when both identifiers
    /// resolve to the same bucket
    async fn copy_file(
        &self,
        source_archive_id: &str,
        source_file_name: &str,
        target_archive_id: &str,
        target_file_name: &str,
    ) -> ArchiveResult<()>;

    /// Move every file of one archive into another and delete the old bucket.
    ///
    /// Not atomic: a failure part-way leaves both buckets partially populated.
    /// Re-invoking after a failure resumes, since an existing target bucket is
    /// accepted and already copied files are copied again.
    async fn migrate_bucket(
        &self,
        old_archive_id: &str,
        new_archive_id: &str,
    ) -> ArchiveResult<MigrationReport>;
}
