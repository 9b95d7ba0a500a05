use async_trait::async_trait;
use object_store::{memory::InMemory, ObjectStore as ApacheObjectStore};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::{
    adapters::outbound::storage::{
        error::{object_error, object_path},
        object_ops,
    },
    domain::{
        errors::{ArchiveError, ArchiveResult},
        models::{ByteStream, ObjectDownload, ObjectStat},
        value_objects::{BucketName, ObjectName},
    },
    ports::storage::ObjectStoreClient,
};

/// Object store client keeping every bucket in process memory.
///
/// Each bucket is its own `object_store` in-memory store, so bucket
/// boundaries behave like those of a remote store.
#[derive(Clone, Default)]
pub struct InMemoryObjectStoreClient {
    buckets: Arc<RwLock<HashMap<BucketName, Arc<InMemory>>>>,
}

impl InMemoryObjectStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn bucket(&self, bucket: &BucketName) -> ArchiveResult<Arc<InMemory>> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .cloned()
            .ok_or_else(|| ArchiveError::BucketNotFound {
                bucket: bucket.clone(),
            })
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStoreClient {
    async fn bucket_exists(&self, bucket: &BucketName) -> ArchiveResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Err(ArchiveError::BucketAlreadyExists {
                bucket: bucket.clone(),
            });
        }

        buckets.insert(bucket.clone(), Arc::new(InMemory::new()));
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        // Write lock held across the emptiness check so no put can slip in
        let mut buckets = self.buckets.write().await;
        let store = buckets
            .get(bucket)
            .ok_or_else(|| ArchiveError::BucketNotFound {
                bucket: bucket.clone(),
            })?;

        if object_ops::has_objects(&**store).await? {
            return Err(ArchiveError::BucketNotEmpty {
                bucket: bucket.clone(),
            });
        }

        buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(&self, bucket: &BucketName) -> ArchiveResult<Vec<ObjectStat>> {
        let store = self.bucket(bucket).await?;
        object_ops::list(&*store).await
    }

    async fn stat_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<Option<ObjectStat>> {
        let store = self.bucket(bucket).await?;
        object_ops::stat(&*store, name).await
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        data: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        let store = self.bucket(bucket).await?;
        let attributes = object_ops::content_type_attributes(content_type);
        object_ops::put_stream(&*store, name, data, attributes).await
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<ObjectDownload> {
        let store = self.bucket(bucket).await?;
        object_ops::get(&*store, bucket, name).await
    }

    async fn remove_object(&self, bucket: &BucketName, name: &ObjectName) -> ArchiveResult<()> {
        let store = self.bucket(bucket).await?;
        object_ops::remove(&*store, bucket, name).await
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_name: &ObjectName,
        destination_bucket: &BucketName,
        destination_name: &ObjectName,
    ) -> ArchiveResult<()> {
        let source = self.bucket(source_bucket).await?;
        let destination = self.bucket(destination_bucket).await?;

        if source_bucket == destination_bucket {
            return source
                .copy(&object_path(source_name)?, &object_path(destination_name)?)
                .await
                .map_err(|e| object_error(e, source_bucket, source_name));
        }

        // Two in-process stores share no server to copy on, so move the bytes
        let (data, attributes) =
            object_ops::read(&*source, source_bucket, source_name).await?;
        object_ops::put(&*destination, destination_name, data, attributes).await
    }
}
