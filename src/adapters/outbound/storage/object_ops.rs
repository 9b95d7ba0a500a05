//! Object-level operations shared by every `object_store` backed client.
//!
//! A backend handle here is scoped to one bucket, so these helpers only
//! deal with names inside it.

use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, GetResult, ObjectMeta,
    ObjectStore as ApacheObjectStore, PutMultipartOpts, PutOptions, PutPayload, WriteMultipart,
};
use tracing::{debug, warn};

use crate::{
    adapters::outbound::storage::error::{
        object_error, object_name_from_path, object_path, StoreError,
    },
    domain::{
        errors::{ArchiveError, ArchiveResult},
        models::{ByteStream, ObjectDownload, ObjectStat},
        value_objects::{BucketName, ObjectName},
    },
};

/// Part size for multipart uploads; bodies up to one part go out as a single PUT.
/// S3 requires every part but the last to be at least 5 MiB.
pub(crate) const MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;

/// Parts allowed in flight at once during a multipart upload
const MAX_CONCURRENT_PARTS: usize = 4;

pub(crate) fn content_type_attributes(content_type: Option<&str>) -> Attributes {
    let mut attributes = Attributes::new();
    if let Some(content_type) = content_type {
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
    }
    attributes
}

fn content_type_of(result: &GetResult) -> Option<String> {
    result
        .attributes
        .get(&Attribute::ContentType)
        .map(|value| value.as_ref().to_string())
}

fn to_stat(meta: ObjectMeta, content_type: Option<String>) -> ArchiveResult<ObjectStat> {
    Ok(ObjectStat {
        name: object_name_from_path(&meta.location)?,
        size: meta.size,
        last_modified: meta.last_modified,
        etag: meta.e_tag,
        content_type,
    })
}

pub(crate) async fn list(store: &dyn ApacheObjectStore) -> ArchiveResult<Vec<ObjectStat>> {
    let metas: Vec<ObjectMeta> = store
        .list(None)
        .try_collect()
        .await
        .map_err(StoreError::from)?;

    metas.into_iter().map(|meta| to_stat(meta, None)).collect()
}

/// True when the bucket holds at least one object
pub(crate) async fn has_objects(store: &dyn ApacheObjectStore) -> ArchiveResult<bool> {
    match store.list(None).next().await {
        Some(Ok(_)) => Ok(true),
        Some(Err(e)) => Err(StoreError::from(e).into()),
        None => Ok(false),
    }
}

pub(crate) async fn stat(
    store: &dyn ApacheObjectStore,
    name: &ObjectName,
) -> ArchiveResult<Option<ObjectStat>> {
    let options = GetOptions {
        head: true,
        ..Default::default()
    };

    match store.get_opts(&object_path(name)?, options).await {
        Ok(result) => {
            let content_type = content_type_of(&result);
            to_stat(result.meta, content_type).map(Some)
        }
        Err(object_store::Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(StoreError::from(e).into()),
    }
}

pub(crate) async fn put(
    store: &dyn ApacheObjectStore,
    name: &ObjectName,
    data: Bytes,
    attributes: Attributes,
) -> ArchiveResult<()> {
    let options = PutOptions {
        attributes,
        ..Default::default()
    };

    store
        .put_opts(&object_path(name)?, PutPayload::from(data), options)
        .await
        .map_err(StoreError::from)?;

    Ok(())
}

/// Write a streamed body, returning the number of bytes stored.
///
/// The first part is buffered; a body that ends within it is written with one
/// PUT, anything longer becomes a multipart upload that is aborted on failure.
pub(crate) async fn put_stream(
    store: &dyn ApacheObjectStore,
    name: &ObjectName,
    mut data: ByteStream<'_>,
    attributes: Attributes,
) -> ArchiveResult<u64> {
    let mut head = BytesMut::new();
    while head.len() < MULTIPART_PART_SIZE {
        match data.try_next().await? {
            Some(chunk) => head.extend_from_slice(&chunk),
            None => {
                let size = head.len() as u64;
                put(store, name, head.freeze(), attributes).await?;
                return Ok(size);
            }
        }
    }

    let options = PutMultipartOpts {
        attributes,
        ..Default::default()
    };
    let upload = store
        .put_multipart_opts(&object_path(name)?, options)
        .await
        .map_err(StoreError::from)?;
    let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_PART_SIZE);

    let mut size = head.len() as u64;
    writer.put(head.freeze());

    let streamed: ArchiveResult<()> = async {
        while let Some(chunk) = data.try_next().await? {
            writer
                .wait_for_capacity(MAX_CONCURRENT_PARTS)
                .await
                .map_err(StoreError::from)?;
            size += chunk.len() as u64;
            writer.put(chunk);
        }
        Ok(())
    }
    .await;

    match streamed {
        Ok(()) => {
            writer.finish().await.map_err(StoreError::from)?;
            debug!(file = %name, size, "Completed multipart upload");
            Ok(size)
        }
        Err(e) => {
            if let Err(abort) = writer.abort().await {
                warn!(file = %name, error = %abort, "Failed to abort multipart upload");
            }
            Err(e)
        }
    }
}

pub(crate) async fn get(
    store: &dyn ApacheObjectStore,
    bucket: &BucketName,
    name: &ObjectName,
) -> ArchiveResult<ObjectDownload> {
    let result = store
        .get(&object_path(name)?)
        .await
        .map_err(|e| object_error(e, bucket, name))?;

    let content_type = content_type_of(&result);
    let stat = to_stat(result.meta.clone(), content_type)?;
    let stream = result
        .into_stream()
        .map_err(|e| ArchiveError::from(StoreError::from(e)))
        .boxed();

    Ok(ObjectDownload { stat, stream })
}

/// Read a whole object together with its attributes
pub(crate) async fn read(
    store: &dyn ApacheObjectStore,
    bucket: &BucketName,
    name: &ObjectName,
) -> ArchiveResult<(Bytes, Attributes)> {
    let result = store
        .get(&object_path(name)?)
        .await
        .map_err(|e| object_error(e, bucket, name))?;
    let attributes = result.attributes.clone();
    let data = result
        .bytes()
        .await
        .map_err(|e| object_error(e, bucket, name))?;

    Ok((data, attributes))
}

pub(crate) async fn remove(
    store: &dyn ApacheObjectStore,
    bucket: &BucketName,
    name: &ObjectName,
) -> ArchiveResult<()> {
    let path = object_path(name)?;

    // Deleting a missing key is not an error for object_store, so probe first
    store
        .head(&path)
        .await
        .map_err(|e| object_error(e, bucket, name))?;

    store
        .delete(&path)
        .await
        .map_err(|e| object_error(e, bucket, name))
}
