use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt, TryStreamExt};
use std::{future::Future, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        errors::{ArchiveError, ArchiveResult},
        models::{
            ByteStream, DownloadedFile, DrainPolicy, DrainReport, MigrationReport, ObjectDownload,
        },
        value_objects::{BucketName, ObjectName},
    },
    ports::{services::ArchiveService, storage::ObjectStoreClient},
};

/// Tunables shared by every operation of the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Deadline for one public operation, composites included
    pub operation_timeout: Option<Duration>,
    pub drain_policy: DrainPolicy,
}

/// Implementation of ArchiveService on top of an object store client
#[derive(Clone)]
pub struct ArchiveServiceImpl {
    client: Arc<dyn ObjectStoreClient>,
    settings: ServiceSettings,
    cancellation: Option<CancellationToken>,
}

impl ArchiveServiceImpl {
    /// Create a new ArchiveServiceImpl with default settings
    pub fn new(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self::with_settings(client, ServiceSettings::default())
    }

    pub fn with_settings(client: Arc<dyn ObjectStoreClient>, settings: ServiceSettings) -> Self {
        Self {
            client,
            settings,
            cancellation: None,
        }
    }

    /// A handle whose operations abort with `Cancelled` once `token` fires.
    ///
    /// The returned service shares the client; the original is unaffected.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.clone(),
            settings: self.settings,
            cancellation: Some(token),
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Run one public operation under the configured deadline and token
    async fn guarded<T, F>(&self, operation: &'static str, fut: F) -> ArchiveResult<T>
    where
        F: Future<Output = ArchiveResult<T>> + Send,
    {
        let timed = async move {
            match self.settings.operation_timeout {
                Some(after) => match tokio::time::timeout(after, fut).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(operation, ?after, "Operation timed out");
                        Err(ArchiveError::Timeout { operation, after })
                    }
                },
                None => fut.await,
            }
        };

        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!(operation, "Operation cancelled");
                        Err(ArchiveError::Cancelled { operation })
                    }
                    result = timed => result,
                }
            }
            None => timed.await,
        }
    }

    fn bucket_for(archive_id: &str) -> ArchiveResult<BucketName> {
        BucketName::from_identifier(archive_id).map_err(|reason| ArchiveError::InvalidIdentifier {
            identifier: archive_id.to_string(),
            reason,
        })
    }

    fn object_name(file_name: &str) -> ArchiveResult<ObjectName> {
        ObjectName::new(file_name.to_string()).map_err(|reason| ArchiveError::InvalidFileName {
            name: file_name.to_string(),
            reason,
        })
    }

    async fn require_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        if self.client.bucket_exists(bucket).await? {
            Ok(())
        } else {
            Err(ArchiveError::BucketNotFound {
                bucket: bucket.clone(),
            })
        }
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket))]
    async fn create(&self, bucket: BucketName) -> ArchiveResult<BucketName> {
        if self.client.bucket_exists(&bucket).await? {
            warn!("Bucket already exists");
            return Err(ArchiveError::BucketAlreadyExists { bucket });
        }

        self.client.make_bucket(&bucket).await?;
        info!("Created bucket");
        Ok(bucket)
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, policy = %self.settings.drain_policy))]
    async fn drain_and_remove(&self, bucket: BucketName) -> ArchiveResult<DrainReport> {
        self.require_bucket(&bucket).await?;

        let objects = self.client.list_objects(&bucket).await?;
        debug!(count = objects.len(), "Draining bucket");

        let mut removed = Vec::with_capacity(objects.len());
        let mut first_failure = None;

        for object in objects {
            match self.client.remove_object(&bucket, &object.name).await {
                Ok(()) => {
                    debug!(object = %object.name, "Deleted object");
                    removed.push(object.name);
                }
                // Already gone, e.g. a retried drain
                Err(ArchiveError::FileNotFound { .. }) => {
                    debug!(object = %object.name, "Object vanished during drain");
                    removed.push(object.name);
                }
                Err(e) => {
                    error!(object = %object.name, error = %e, "Failed to delete object");
                    match self.settings.drain_policy {
                        DrainPolicy::FailFast => return Err(e),
                        DrainPolicy::BestEffort => {
                            first_failure.get_or_insert(e);
                        }
                    }
                }
            }
        }

        if let Some(e) = first_failure {
            warn!(removed = removed.len(), "Bucket left in place after partial drain");
            return Err(e);
        }

        self.client.remove_bucket(&bucket).await?;
        info!(removed = removed.len(), "Deleted bucket");

        Ok(DrainReport { bucket, removed })
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, file = %name))]
    async fn upload(
        &self,
        bucket: BucketName,
        name: ObjectName,
        content: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        self.require_bucket(&bucket).await?;

        if self.client.stat_object(&bucket, &name).await?.is_some() {
            warn!("File already exists, deleting it first");
            match self.client.remove_object(&bucket, &name).await {
                Ok(()) | Err(ArchiveError::FileNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        info!("Uploading file");
        let size = self
            .client
            .put_object(&bucket, &name, content, content_type)
            .await?;
        debug!(size, "File uploaded");
        Ok(size)
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, file = %name))]
    async fn download(&self, bucket: BucketName, name: ObjectName) -> ArchiveResult<DownloadedFile> {
        let download = self.client.get_object(&bucket, &name).await?;
        let content_type = download.stat.content_type.clone();

        let data = download
            .stream
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok::<_, ArchiveError>(buffer)
            })
            .await?
            .freeze();

        debug!(size = data.len(), "Downloaded file");
        Ok(DownloadedFile {
            name,
            content_type,
            data,
        })
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, file = %name))]
    async fn remove_file(&self, bucket: BucketName, name: ObjectName) -> ArchiveResult<()> {
        self.client.remove_object(&bucket, &name).await?;
        debug!("Deleted file");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(source = %source_bucket, target = %target_bucket))]
    async fn copy(
        &self,
        source_bucket: BucketName,
        source_name: ObjectName,
        target_bucket: BucketName,
        target_name: ObjectName,
    ) -> ArchiveResult<()> {
        if source_bucket == target_bucket {
            warn!("Source and destination buckets are the same, skipping copy");
            return Ok(());
        }

        self.client
            .copy_object(&source_bucket, &source_name, &target_bucket, &target_name)
            .await
            .inspect_err(|e| error!(file = %source_name, error = %e, "Copy failed"))?;

        debug!(from = %source_name, to = %target_name, "Copied file");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(source = %source, target = %target))]
    async fn migrate(&self, source: BucketName, target: BucketName) -> ArchiveResult<MigrationReport> {
        if source == target {
            warn!("Source and target resolve to the same bucket, nothing to migrate");
            return Ok(MigrationReport {
                source,
                target,
                copied: Vec::new(),
            });
        }

        self.require_bucket(&source).await?;

        match self.client.make_bucket(&target).await {
            Ok(()) => info!("Created target bucket"),
            Err(ArchiveError::BucketAlreadyExists { .. }) => {
                info!("Target bucket exists, resuming migration into it")
            }
            Err(e) => return Err(e),
        }

        let objects = self.client.list_objects(&source).await?;
        let mut copied = Vec::with_capacity(objects.len());
        for object in objects {
            self.client
                .copy_object(&source, &object.name, &target, &object.name)
                .await
                .inspect_err(|e| {
                    error!(
                        file = %object.name,
                        copied = copied.len(),
                        error = %e,
                        "Migration stopped part-way"
                    )
                })?;
            copied.push(object.name);
        }

        self.drain_and_remove(source.clone()).await?;
        info!(copied = copied.len(), "Migrated bucket");

        Ok(MigrationReport {
            source,
            target,
            copied,
        })
    }
}

#[async_trait]
impl ArchiveService for ArchiveServiceImpl {
    async fn bucket_exists(&self, archive_id: &str) -> ArchiveResult<bool> {
        let bucket = Self::bucket_for(archive_id)?;
        self.guarded("bucket_exists", self.client.bucket_exists(&bucket))
            .await
    }

    async fn create_bucket(&self, archive_id: &str) -> ArchiveResult<BucketName> {
        let bucket = Self::bucket_for(archive_id)?;
        self.guarded("create_bucket", self.create(bucket)).await
    }

    async fn delete_bucket(&self, archive_id: &str) -> ArchiveResult<DrainReport> {
        let bucket = Self::bucket_for(archive_id)?;
        self.guarded("delete_bucket", self.drain_and_remove(bucket))
            .await
    }

    async fn upload_file(
        &self,
        archive_id: &str,
        file_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> ArchiveResult<()> {
        let bucket = Self::bucket_for(archive_id)?;
        let name = Self::object_name(file_name)?;
        let body = stream::iter([Ok(content)]).boxed();
        self.guarded("upload_file", self.upload(bucket, name, body, content_type))
            .await?;
        Ok(())
    }

    async fn upload_stream(
        &self,
        archive_id: &str,
        file_name: &str,
        content: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        let bucket = Self::bucket_for(archive_id)?;
        let name = Self::object_name(file_name)?;
        self.guarded(
            "upload_stream",
            self.upload(bucket, name, content, content_type),
        )
        .await
    }

    async fn download_file(
        &self,
        archive_id: &str,
        file_name: &str,
    ) -> ArchiveResult<DownloadedFile> {
        let bucket = Self::bucket_for(archive_id)?;
        let name = Self::object_name(file_name)?;
        self.guarded("download_file", self.download(bucket, name))
            .await
    }

    async fn download_stream(
        &self,
        archive_id: &str,
        file_name: &str,
    ) -> ArchiveResult<ObjectDownload> {
        let bucket = Self::bucket_for(archive_id)?;
        let name = Self::object_name(file_name)?;
        // The deadline covers opening the stream; reading it is up to the caller
        self.guarded("download_stream", self.client.get_object(&bucket, &name))
            .await
    }

    async fn list_files(&self, archive_id: &str) -> ArchiveResult<Vec<ObjectName>> {
        let bucket = Self::bucket_for(archive_id)?;
        let objects = self
            .guarded("list_files", self.client.list_objects(&bucket))
            .await?;
        debug!(bucket = %bucket, count = objects.len(), "Listed files");
        Ok(objects.into_iter().map(|o| o.name).collect())
    }

    async fn delete_file(&self, archive_id: &str, file_name: &str) -> ArchiveResult<()> {
        let bucket = Self::bucket_for(archive_id)?;
        let name = Self::object_name(file_name)?;
        self.guarded("delete_file", self.remove_file(bucket, name))
            .await
    }

    async fn copy_file(
        &self,
        source_archive_id: &str,
        source_file_name: &str,
        target_archive_id: &str,
        target_file_name: &str,
    ) -> ArchiveResult<()> {
        let source_bucket = Self::bucket_for(source_archive_id)?;
        let source_name = Self::object_name(source_file_name)?;
        let target_bucket = Self::bucket_for(target_archive_id)?;
        let target_name = Self::object_name(target_file_name)?;
        self.guarded(
            "copy_file",
            self.copy(source_bucket, source_name, target_bucket, target_name),
        )
        .await
    }

    async fn migrate_bucket(
        &self,
        old_archive_id: &str,
        new_archive_id: &str,
    ) -> ArchiveResult<MigrationReport> {
        let source = Self::bucket_for(old_archive_id)?;
        let target = Self::bucket_for(new_archive_id)?;
        self.guarded("migrate_bucket", self.migrate(source, target))
            .await
    }
}

/// Builder for ArchiveServiceImpl
#[derive(Default)]
pub struct ArchiveServiceBuilder {
    client: Option<Arc<dyn ObjectStoreClient>>,
    settings: ServiceSettings,
}

impl ArchiveServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: Arc<dyn ObjectStoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.settings.operation_timeout = Some(timeout);
        self
    }

    pub fn drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.settings.drain_policy = policy;
        self
    }

    pub fn build(self) -> Result<ArchiveServiceImpl, &'static str> {
        let client = self.client.ok_or("Client is required")?;

        Ok(ArchiveServiceImpl::with_settings(client, self.settings))
    }
}
