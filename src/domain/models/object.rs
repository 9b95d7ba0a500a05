use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::domain::{errors::ArchiveResult, value_objects::ObjectName};

/// Content type used when neither the caller nor the store supplies one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata about one stored file, as reported by the object store
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStat {
    pub name: ObjectName,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    /// Only populated by stat/get; listings do not carry it
    pub content_type: Option<String>,
}

/// Byte stream of a file body, borrowed from its source for `'a`
pub type ByteStream<'a> = BoxStream<'a, ArchiveResult<Bytes>>;

/// Byte stream of an object body owned by the download
pub type ObjectStream = ByteStream<'static>;

/// A live download: metadata plus the body stream.
///
/// Dropping the value releases the underlying connection or buffer.
pub struct ObjectDownload {
    pub stat: ObjectStat,
    pub stream: ObjectStream,
}

impl std::fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("stat", &self.stat)
            .finish_non_exhaustive()
    }
}

/// A fully buffered file returned to callers handling small payloads
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub name: ObjectName,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl DownloadedFile {
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}
