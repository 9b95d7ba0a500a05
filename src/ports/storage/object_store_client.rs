use async_trait::async_trait;

use crate::domain::{
    errors::ArchiveResult,
    models::{ByteStream, ObjectDownload, ObjectStat},
    value_objects::{BucketName, ObjectName},
};

/// Port for the remote object store holding the archive buckets.
///
/// Each call is one round trip; implementations keep no local view of the
/// store. Errors use the archive taxonomy: `BucketNotFound`, `FileNotFound`,
/// `BucketAlreadyExists`, `BucketNotEmpty` for the conditions named on each
/// method and `ServiceError` for everything else.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &BucketName) -> ArchiveResult<bool>;

    /// Create a bucket; `BucketAlreadyExists` if present
    async fn make_bucket(&self, bucket: &BucketName) -> ArchiveResult<()>;

    /// Remove an empty bucket; `BucketNotEmpty` if it still holds objects,
    /// `BucketNotFound` if absent
    async fn remove_bucket(&self, bucket: &BucketName) -> ArchiveResult<()>;

    /// List every object in the bucket in store order; `BucketNotFound` if absent
    async fn list_objects(&self, bucket: &BucketName) -> ArchiveResult<Vec<ObjectStat>>;

    /// Existence probe; `None` when the object is absent
    async fn stat_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<Option<ObjectStat>>;

    /// Store object data read from `data` and return the stored size.
    ///
    /// Bodies larger than one part are sent as a multipart upload, so the
    /// whole payload is never held in memory. Overwrite behavior is
    /// store-defined; `BucketNotFound` if the bucket is absent
    async fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        data: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64>;

    /// Open the object body as a stream; `FileNotFound` if absent
    async fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<ObjectDownload>;

    /// Remove one object; `FileNotFound` if absent
    async fn remove_object(&self, bucket: &BucketName, name: &ObjectName) -> ArchiveResult<()>;

    /// Server-side copy; copying an object onto itself is store-defined and
    /// must be avoided by callers
    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_name: &ObjectName,
        destination_bucket: &BucketName,
        destination_name: &ObjectName,
    ) -> ArchiveResult<()>;
}
