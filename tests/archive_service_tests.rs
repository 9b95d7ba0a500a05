use archive_file_store::{
    create_in_memory_app, ArchiveError, ArchiveResult, ArchiveService, ArchiveServiceBuilder,
    ArchiveServiceImpl, BucketName, ByteStream, DrainPolicy, InMemoryObjectStoreClient,
    ObjectDownload, ObjectName, ObjectStat, ObjectStoreClient,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

fn in_memory_service() -> (ArchiveServiceImpl, Arc<InMemoryObjectStoreClient>) {
    let client = Arc::new(InMemoryObjectStoreClient::new());
    (ArchiveServiceImpl::new(client.clone()), client)
}

fn bucket(name: &str) -> BucketName {
    BucketName::new(name.to_string()).unwrap()
}

async fn names(service: &impl ArchiveService, archive: &str) -> Vec<String> {
    let mut names: Vec<String> = service
        .list_files(archive)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn create_and_delete_round_trip() {
    let services = create_in_memory_app().await.unwrap();
    let service = &services.archive_service;

    let created = service.create_bucket("AB-2023/17").await.unwrap();
    assert_eq!(created.as_str(), "ab-2023-17");
    assert!(service.bucket_exists("AB-2023/17").await.unwrap());
    // Any identifier normalizing to the same bucket sees it
    assert!(service.bucket_exists("ab 2023 17").await.unwrap());

    let report = service.delete_bucket("AB-2023/17").await.unwrap();
    assert!(report.removed.is_empty());
    assert!(!service.bucket_exists("AB-2023/17").await.unwrap());
}

#[tokio::test]
async fn double_create_fails() {
    let (service, _) = in_memory_service();

    service.create_bucket("song-1").await.unwrap();
    let err = service.create_bucket("Song 1").await.unwrap_err();

    assert!(matches!(err, ArchiveError::BucketAlreadyExists { bucket } if bucket.as_str() == "song-1"));
}

#[tokio::test]
async fn invalid_identifier_is_rejected_before_the_store() {
    let (service, _) = in_memory_service();

    for identifier in ["", "   ", "--//__", "äöü"] {
        let err = service.create_bucket(identifier).await.unwrap_err();
        assert!(
            matches!(err, ArchiveError::InvalidIdentifier { .. }),
            "{identifier:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn raw_remove_of_non_empty_bucket_fails_but_delete_bucket_drains() {
    let (service, client) = in_memory_service();
    service.create_bucket("song-2").await.unwrap();
    for name in ["a.txt", "b.txt", "parts/c.txt"] {
        service
            .upload_file("song-2", name, Bytes::from(name.to_string()), None)
            .await
            .unwrap();
    }

    let err = client.remove_bucket(&bucket("song-2")).await.unwrap_err();
    assert!(matches!(err, ArchiveError::BucketNotEmpty { .. }));

    let report = service.delete_bucket("song-2").await.unwrap();
    assert_eq!(report.removed.len(), 3);
    assert!(!service.bucket_exists("song-2").await.unwrap());
}

#[tokio::test]
async fn upload_overwrite_returns_second_content() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-3").await.unwrap();

    service
        .upload_file("song-3", "score.pdf", Bytes::from("first"), Some("application/pdf"))
        .await
        .unwrap();
    service
        .upload_file("song-3", "score.pdf", Bytes::from("second version"), Some("text/plain"))
        .await
        .unwrap();

    let file = service.download_file("song-3", "score.pdf").await.unwrap();
    assert_eq!(file.data, Bytes::from("second version"));
    assert_eq!(file.content_type.as_deref(), Some("text/plain"));
    assert_eq!(names(&service, "song-3").await, vec!["score.pdf"]);
}

#[tokio::test]
async fn upload_into_missing_bucket_fails() {
    let (service, _) = in_memory_service();

    let err = service
        .upload_file("nowhere", "a.txt", Bytes::from("x"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::BucketNotFound { .. }));
}

#[tokio::test]
async fn invalid_file_name_is_rejected() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-4").await.unwrap();

    let err = service
        .upload_file("song-4", "/etc/passwd", Bytes::from("x"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::InvalidFileName { .. }));
}

#[tokio::test]
async fn list_reflects_state() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-5").await.unwrap();
    assert!(names(&service, "song-5").await.is_empty());

    for name in ["1.pdf", "2.pdf", "3.pdf"] {
        service
            .upload_file("song-5", name, Bytes::from("x"), None)
            .await
            .unwrap();
    }
    assert_eq!(names(&service, "song-5").await.len(), 3);

    service.delete_file("song-5", "2.pdf").await.unwrap();
    assert_eq!(names(&service, "song-5").await, vec!["1.pdf", "3.pdf"]);
}

#[tokio::test]
async fn list_of_missing_bucket_fails() {
    let (service, _) = in_memory_service();

    let err = service.list_files("song-404").await.unwrap_err();
    assert!(matches!(err, ArchiveError::BucketNotFound { .. }));
}

#[tokio::test]
async fn not_found_errors() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-6").await.unwrap();

    let err = service.download_file("song-6", "missing.pdf").await.unwrap_err();
    assert!(matches!(err, ArchiveError::FileNotFound { .. }));

    let err = service.delete_file("song-6", "missing.pdf").await.unwrap_err();
    assert!(matches!(err, ArchiveError::FileNotFound { .. }));

    let err = service.delete_bucket("song-404").await.unwrap_err();
    assert!(matches!(err, ArchiveError::BucketNotFound { .. }));
}

#[tokio::test]
async fn copy_between_archives() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-7").await.unwrap();
    service.create_bucket("song-8").await.unwrap();
    service
        .upload_file("song-7", "score.pdf", Bytes::from("notes"), Some("application/pdf"))
        .await
        .unwrap();

    service
        .copy_file("song-7", "score.pdf", "song-8", "score-copy.pdf")
        .await
        .unwrap();

    let copy = service.download_file("song-8", "score-copy.pdf").await.unwrap();
    assert_eq!(copy.data, Bytes::from("notes"));
    assert_eq!(copy.content_type.as_deref(), Some("application/pdf"));
    // Source untouched
    assert_eq!(names(&service, "song-7").await, vec!["score.pdf"]);
}

#[tokio::test]
async fn self_copy_is_a_no_op() {
    let (service, _) = in_memory_service();
    service.create_bucket("song-9").await.unwrap();
    service
        .upload_file("song-9", "score.pdf", Bytes::from("notes"), None)
        .await
        .unwrap();

    // Identifiers normalizing to one bucket count as the same bucket
    service
        .copy_file("Song 9", "score.pdf", "song-9", "other.pdf")
        .await
        .unwrap();

    assert_eq!(names(&service, "song-9").await, vec!["score.pdf"]);
}

#[tokio::test]
async fn migration_preserves_names_and_bytes() {
    let (service, _) = in_memory_service();
    service.create_bucket("old-archive").await.unwrap();
    let files = [
        ("score.pdf", "score bytes"),
        ("parts/horn 1.pdf", "horn bytes"),
        ("recording.mp3", "audio bytes"),
    ];
    for (name, content) in files {
        service
            .upload_file("old-archive", name, Bytes::from(content), None)
            .await
            .unwrap();
    }

    let report = service
        .migrate_bucket("old-archive", "New Archive")
        .await
        .unwrap();

    assert_eq!(report.source.as_str(), "old-archive");
    assert_eq!(report.target.as_str(), "new-archive");
    let copied: HashSet<String> = report.copied.iter().map(|n| n.to_string()).collect();
    assert_eq!(copied.len(), 3);

    assert!(!service.bucket_exists("old-archive").await.unwrap());
    for (name, content) in files {
        let file = service.download_file("new-archive", name).await.unwrap();
        assert_eq!(file.data, Bytes::from(content));
    }
}

#[tokio::test]
async fn migration_resumes_into_existing_target() {
    let (service, _) = in_memory_service();
    service.create_bucket("old-1").await.unwrap();
    service.create_bucket("new-1").await.unwrap();
    service
        .upload_file("old-1", "a.txt", Bytes::from("a"), None)
        .await
        .unwrap();
    service
        .upload_file("new-1", "a.txt", Bytes::from("stale"), None)
        .await
        .unwrap();

    service.migrate_bucket("old-1", "new-1").await.unwrap();

    let file = service.download_file("new-1", "a.txt").await.unwrap();
    assert_eq!(file.data, Bytes::from("a"));
    assert!(!service.bucket_exists("old-1").await.unwrap());
}

#[tokio::test]
async fn migration_onto_itself_is_a_no_op() {
    let (service, _) = in_memory_service();
    service.create_bucket("same-1").await.unwrap();
    service
        .upload_file("same-1", "a.txt", Bytes::from("a"), None)
        .await
        .unwrap();

    let report = service.migrate_bucket("same-1", "SAME 1").await.unwrap();

    assert!(report.copied.is_empty());
    assert_eq!(names(&service, "same-1").await, vec!["a.txt"]);
}

#[tokio::test]
async fn migration_of_missing_bucket_fails() {
    let (service, _) = in_memory_service();

    let err = service.migrate_bucket("ghost-1", "new-2").await.unwrap_err();

    assert!(matches!(err, ArchiveError::BucketNotFound { .. }));
    assert!(!service.bucket_exists("new-2").await.unwrap());
}

#[tokio::test]
async fn download_stream_yields_content() {
    let (service, _) = in_memory_service();
    service.create_bucket("stream-1").await.unwrap();
    service
        .upload_file("stream-1", "big.bin", Bytes::from(vec![7u8; 64 * 1024]), None)
        .await
        .unwrap();

    let download = service.download_stream("stream-1", "big.bin").await.unwrap();
    assert_eq!(download.stat.size, 64 * 1024);

    let chunks: Vec<Bytes> = download.stream.try_collect().await.unwrap();
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    assert_eq!(total, 64 * 1024);
}

#[tokio::test]
async fn upload_stream_replaces_file_with_body_larger_than_one_part() {
    let (service, _) = in_memory_service();
    service.create_bucket("stream-2").await.unwrap();
    service
        .upload_file("stream-2", "take-1.wav", Bytes::from("short"), Some("audio/wav"))
        .await
        .unwrap();

    let chunk = Bytes::from(vec![9u8; 512 * 1024]);
    let chunks: Vec<ArchiveResult<Bytes>> = (0..14).map(|_| Ok(chunk.clone())).collect();
    let size = service
        .upload_stream(
            "stream-2",
            "take-1.wav",
            stream::iter(chunks).boxed(),
            Some("audio/wav"),
        )
        .await
        .unwrap();
    assert_eq!(size, 7 * 1024 * 1024);

    let file = service.download_file("stream-2", "take-1.wav").await.unwrap();
    assert_eq!(file.data.len() as u64, size);
    assert_eq!(file.content_type.as_deref(), Some("audio/wav"));
    assert_eq!(names(&service, "stream-2").await, vec!["take-1.wav"]);
}

#[tokio::test]
async fn upload_stream_into_missing_bucket_fails() {
    let (service, _) = in_memory_service();
    let body = stream::iter([Ok(Bytes::from("x"))]).boxed();

    assert!(matches!(
        service.upload_stream("ghost-2", "a.txt", body, None).await,
        Err(ArchiveError::BucketNotFound { .. })
    ));
}

/// Client whose object removals fail for chosen names, counting attempts
struct FailingRemoveClient {
    inner: InMemoryObjectStoreClient,
    failing: HashSet<String>,
    attempts: AtomicUsize,
}

#[async_trait]
impl ObjectStoreClient for FailingRemoveClient {
    async fn bucket_exists(&self, bucket: &BucketName) -> ArchiveResult<bool> {
        self.inner.bucket_exists(bucket).await
    }

    async fn make_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        self.inner.make_bucket(bucket).await
    }

    async fn remove_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        self.inner.remove_bucket(bucket).await
    }

    async fn list_objects(&self, bucket: &BucketName) -> ArchiveResult<Vec<ObjectStat>> {
        self.inner.list_objects(bucket).await
    }

    async fn stat_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<Option<ObjectStat>> {
        self.inner.stat_object(bucket, name).await
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        data: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        self.inner.put_object(bucket, name, data, content_type).await
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<ObjectDownload> {
        self.inner.get_object(bucket, name).await
    }

    async fn remove_object(&self, bucket: &BucketName, name: &ObjectName) -> ArchiveResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(name.as_str()) {
            return Err(ArchiveError::ServiceError {
                message: "InternalError".to_string(),
                status: Some(500),
            });
        }
        self.inner.remove_object(bucket, name).await
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_name: &ObjectName,
        destination_bucket: &BucketName,
        destination_name: &ObjectName,
    ) -> ArchiveResult<()> {
        self.inner
            .copy_object(source_bucket, source_name, destination_bucket, destination_name)
            .await
    }
}

async fn drain_fixture(policy: DrainPolicy) -> (ArchiveServiceImpl, Arc<FailingRemoveClient>) {
    let client = Arc::new(FailingRemoveClient {
        inner: InMemoryObjectStoreClient::new(),
        failing: HashSet::from(["b.txt".to_string()]),
        attempts: AtomicUsize::new(0),
    });
    let service = ArchiveServiceBuilder::new()
        .client(client.clone())
        .drain_policy(policy)
        .build()
        .unwrap();

    service.create_bucket("drain-1").await.unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        service
            .upload_file("drain-1", name, Bytes::from("x"), None)
            .await
            .unwrap();
    }
    client.attempts.store(0, Ordering::SeqCst);

    (service, client)
}

#[tokio::test]
async fn fail_fast_drain_stops_at_first_failure() {
    let (service, client) = drain_fixture(DrainPolicy::FailFast).await;

    let err = service.delete_bucket("drain-1").await.unwrap_err();

    assert!(matches!(err, ArchiveError::ServiceError { status: Some(500), .. }));
    // In-memory listing is sorted, so a.txt went first and b.txt stopped the drain
    assert_eq!(client.attempts.load(Ordering::SeqCst), 2);
    assert!(service.bucket_exists("drain-1").await.unwrap());
    assert_eq!(names(&service, "drain-1").await, vec!["b.txt", "c.txt"]);
}

#[tokio::test]
async fn best_effort_drain_attempts_everything_and_keeps_bucket() {
    let (service, client) = drain_fixture(DrainPolicy::BestEffort).await;

    let err = service.delete_bucket("drain-1").await.unwrap_err();

    assert!(matches!(err, ArchiveError::ServiceError { .. }));
    assert_eq!(client.attempts.load(Ordering::SeqCst), 3);
    assert!(service.bucket_exists("drain-1").await.unwrap());
    assert_eq!(names(&service, "drain-1").await, vec!["b.txt"]);
}

/// Client whose listings never finish in time
struct StalledListClient {
    inner: InMemoryObjectStoreClient,
}

#[async_trait]
impl ObjectStoreClient for StalledListClient {
    async fn bucket_exists(&self, bucket: &BucketName) -> ArchiveResult<bool> {
        self.inner.bucket_exists(bucket).await
    }

    async fn make_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        self.inner.make_bucket(bucket).await
    }

    async fn remove_bucket(&self, bucket: &BucketName) -> ArchiveResult<()> {
        self.inner.remove_bucket(bucket).await
    }

    async fn list_objects(&self, bucket: &BucketName) -> ArchiveResult<Vec<ObjectStat>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        self.inner.list_objects(bucket).await
    }

    async fn stat_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<Option<ObjectStat>> {
        self.inner.stat_object(bucket, name).await
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
        data: ByteStream<'_>,
        content_type: Option<&str>,
    ) -> ArchiveResult<u64> {
        self.inner.put_object(bucket, name, data, content_type).await
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        name: &ObjectName,
    ) -> ArchiveResult<ObjectDownload> {
        self.inner.get_object(bucket, name).await
    }

    async fn remove_object(&self, bucket: &BucketName, name: &ObjectName) -> ArchiveResult<()> {
        self.inner.remove_object(bucket, name).await
    }

    async fn copy_object(
        &self,
        source_bucket: &BucketName,
        source_name: &ObjectName,
        destination_bucket: &BucketName,
        destination_name: &ObjectName,
    ) -> ArchiveResult<()> {
        self.inner
            .copy_object(source_bucket, source_name, destination_bucket, destination_name)
            .await
    }
}

#[tokio::test]
async fn slow_operation_times_out() {
    let client = Arc::new(StalledListClient {
        inner: InMemoryObjectStoreClient::new(),
    });
    let service = ArchiveServiceBuilder::new()
        .client(client)
        .operation_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    service.create_bucket("slow-1").await.unwrap();

    let err = service.list_files("slow-1").await.unwrap_err();

    assert!(matches!(
        err,
        ArchiveError::Timeout {
            operation: "list_files",
            ..
        }
    ));
}

#[tokio::test]
async fn cancelled_operation_stops() {
    let client = Arc::new(StalledListClient {
        inner: InMemoryObjectStoreClient::new(),
    });
    let base = ArchiveServiceImpl::new(client);
    base.create_bucket("slow-2").await.unwrap();

    let token = CancellationToken::new();
    let service = base.with_cancellation(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = service.delete_bucket("slow-2").await.unwrap_err();

    assert!(matches!(err, ArchiveError::Cancelled { .. }));
    // The uncancelled handle still works
    assert!(base.bucket_exists("slow-2").await.unwrap());
}

#[tokio::test]
async fn already_cancelled_token_short_circuits() {
    let (base, _) = in_memory_service();
    let token = CancellationToken::new();
    token.cancel();

    let err = base
        .with_cancellation(token)
        .create_bucket("never-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Cancelled { operation: "create_bucket" }));
    assert!(!base.bucket_exists("never-1").await.unwrap());
}
