use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use object_store::{
    aws::{AmazonS3, AmazonS3Builder},
    ClientOptions,
};
use reqwest::{Client, Method, StatusCode, Url};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    error_response::{embedded_error, into_archive_error, parse_error},
    signer::{encode_key, hash_payload, SigV4Signer, EMPTY_PAYLOAD_SHA256},
    S3Config,
};
use crate::{
    adapters::outbound::storage::{error::object_path, object_ops, StoreError},
    domain::{
        errors::{ArchiveError, ArchiveResult},
        models::{ByteStream, ObjectDownload, ObjectStat},
        value_objects::{BucketName, ObjectName},
    },
    ports::storage::ObjectStoreClient,
};

const DEFAULT_REGION: &str = "us-east-1";

/// Object store client for S3-compatible services (AWS S3, MinIO)
#[derive(Clone)]
pub struct S3ObjectStoreClient {
    config: S3Config,
    endpoint: Url,
    host: String,
    http: Client,
    signer: SigV4Signer,
    stores: Arc<RwLock<HashMap<BucketName, Arc<AmazonS3>>>>,
}

impl S3ObjectStoreClient {
    pub fn new(config: S3Config) -> Result<Self, StoreError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            StoreError::InvalidConfig(format!("endpoint '{}': {}", config.endpoint, e))
        })?;

        if endpoint.scheme() == "http" && !config.allow_http {
            return Err(StoreError::InvalidConfig(format!(
                "endpoint '{}' uses plain HTTP but allow_http is not set",
                config.endpoint
            )));
        }

        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(StoreError::InvalidConfig(format!(
                    "endpoint '{}' has no host",
                    config.endpoint
                )))
            }
        };

        let mut http = Client::builder();
        if let Some(timeout) = config.request_timeout {
            http = http.timeout(timeout);
        }

        Ok(Self {
            signer: SigV4Signer::new(&config.access_key, &config.secret_key, &config.region),
            http: http.build()?,
            stores: Arc::new(RwLock::new(HashMap::new())),
            endpoint,
            host,
            config,
        })
    }

    fn bucket_path(&self, bucket: &BucketName) -> String {
        format!("{}/{}", self.endpoint.path().trim_end_matches('/'), bucket)
    }

    /// `object_store` handle scoped to one bucket, built on first use
    async fn store(&self, bucket: &BucketName) -> ArchiveResult<Arc<AmazonS3>> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut options = ClientOptions::new().with_allow_http(self.config.allow_http);
        if let Some(timeout) = self.config.request_timeout {
            options = options.with_timeout(timeout);
        }

        let store = AmazonS3Builder::new()
            .with_endpoint(&self.config.endpoint)
            .with_region(&self.config.region)
            .with_bucket_name(bucket.as_str())
            .with_access_key_id(&self.config.access_key)
            .with_secret_access_key(&self.config.secret_key)
            .with_virtual_hosted_style_request(false)
            .with_client_options(options)
            .build()
            .map_err(StoreError::from)?;

        let mut stores = self.stores.write().await;
        Ok(stores
            .entry(bucket.clone())
            .or_insert_with(|| Arc::new(store))
            .clone())
    }

    /// Send a signed request and return the status with the body text
    async fn send(
        &self,
        method: Method,
        canonical_uri: String,
        headers: Vec<(&'static str, String)>,
        body: Bytes,
    ) -> Result<(StatusCode, String), StoreError> {
        let mut url = self.endpoint.clone();
        url.set_path(&canonical_uri);

        let payload_hash = if body.is_empty() {
            EMPTY_PAYLOAD_SHA256.to_string()
        } else {
            hash_payload(&body)
        };

        let to_sign: Vec<(&str, &str)> = headers
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        let auth = self.signer.sign(
            method.as_str(),
            &self.host,
            &canonical_uri,
            &to_sign,
            &payload_hash,
            Utc::now(),
        );

        debug!(%method, path = %canonical_uri, "Sending S3 request");
        let mut request = self.http.request(method, url).body(body);
        for (name, value) in headers.iter().chain(auth.iter()) {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    /// Object calls against a missing bucket surface as generic failures;
    /// report those as `BucketNotFound` instead
    async fn explain(&self, bucket: &BucketName, err: ArchiveError) -> ArchiveError {
        match self.bucket_exists(bucket).await {
            Ok(false) => ArchiveError::BucketNotFound {
                bucket: bucket.clone(),
            },
            _ => err,
        }
    }
}

fn create_bucket_body(region: &str) -> Bytes {
    if region == DEFAULT_REGION {
        return Bytes::new();
    }
    Bytes::from(format!(
        "<CreateBucketConfiguration xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <LocationConstraint>{region}</LocationConstraint></CreateBucketConfiguration>"
    ))
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStoreClient {
    async fn bucket_exists(&self, bucket: &BucketName) -> ArchiveResult<bool> {
        let (status, body) = self
            .send(Method::HEAD, self.bucket_path(bucket), Vec::new(), Bytes::new())
            .await?;

        match status {
            s if s.is_success() => Ok(true),
            s if s == StatusCode::NOT_FOUND => Ok(false),
            s => Err(into_archive_error(
                parse_error(s.as_u16(), &body),
                bucket,
                None,
            )),
        }
    }

    async fn make_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        let (status, body) = self
            .send(
                Method::PUT,
                self.bucket_path(bucket),
                Vec::new(),
                create_bucket_body(&self.config.region),
            )
            .await?;

        if !status.is_success() {
            return Err(into_archive_error(
                parse_error(status.as_u16(), &body),
                bucket,
                None,
            ));
        }

        debug!(bucket = %bucket, "Created S3 bucket");
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        let (status, body) = self
            .send(Method::DELETE, self.bucket_path(bucket), Vec::new(), Bytes::new())
            .await?;

        if !status.is_success() {
            return Err(into_archive_error(
                parse_error(status.as_u16(), &body),
                bucket,
                None,
            ));
        }

        self.stores.write().await.remove(bucket);
        debug!(bucket = %bucket, "Removed S3 bucket");
        Ok(())
    }

    async fn list_objects(&self, bucket: &BucketName) -> ArchiveResult<Vec<ObjectStat>> {
        let store = self.store(bucket).await?;
        match object_ops::list(&*store).await {
            Ok(objects) => Ok(objects),
            Err(e) => Err(self.explain(bucket, e).await),
        }
    }

    async fn stat_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<Option<ObjectStat>> {
        let store = self.store(bucket).await?;
        match object_ops::stat(&*store, name).await {
            Ok(Some(stat)) => Ok(Some(stat)),
            // A HEAD against a missing bucket looks like a missing object
            Ok(None) if !self.bucket_exists(bucket).await? => Err(ArchiveError::BucketNotFound {
                bucket: bucket.clone(),
            }),
            Ok(None) => Ok(None),
            Err(e) => Err(self.explain(bucket, e).await),
        }
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        data: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        let store = self.store(bucket).await?;
        let attributes = object_ops::content_type_attributes(content_type);
        match object_ops::put_stream(&*store, name, data, attributes).await {
            Ok(size) => Ok(size),
            Err(e) => Err(self.explain(bucket, e).await),
        }
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<ObjectDownload> {
        let store = self.store(bucket).await?;
        match object_ops::get(&*store, bucket, name).await {
            Ok(download) => Ok(download),
            Err(e) => Err(self.explain(bucket, e).await),
        }
    }

    async fn remove_object(&self, bucket: &BucketName, name: &ObjectName) -> ArchiveResult<()> {
        let store = self.store(bucket).await?;
        match object_ops::remove(&*store, bucket, name).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.explain(bucket, e).await),
        }
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_name: &ObjectName,
        destination_bucket: &BucketName,
        destination_name: &ObjectName,
    ) -> ArchiveResult<()> {
        let source_key = encode_key(object_path(source_name)?.as_ref());
        let destination_key = encode_key(object_path(destination_name)?.as_ref());

        let canonical_uri = format!("{}/{}", self.bucket_path(destination_bucket), destination_key);
        let copy_source = format!("/{}/{}", source_bucket, source_key);

        let (status, body) = self
            .send(
                Method::PUT,
                canonical_uri,
                vec![("x-amz-copy-source", copy_source)],
                Bytes::new(),
            )
            .await?;

        if !status.is_success() {
            let err = into_archive_error(
                parse_error(status.as_u16(), &body),
                source_bucket,
                Some(source_name),
            );
            // NoSuchBucket does not say which side is missing
            return Err(match err {
                ArchiveError::BucketNotFound { .. } if self.bucket_exists(source_bucket).await? => {
                    ArchiveError::BucketNotFound {
                        bucket: destination_bucket.clone(),
                    }
                }
                other => other,
            });
        }

        if let Some(err) = embedded_error(status.as_u16(), &body) {
            return Err(err.into());
        }

        debug!(
            from = %format!("{source_bucket}/{source_name}"),
            to = %format!("{destination_bucket}/{destination_name}"),
            "Copied object server-side"
        );
        Ok(())
    }
}
