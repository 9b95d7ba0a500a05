use quick_xml::de::from_str;
use serde::Deserialize;

use crate::{
    adapters::outbound::storage::error::StoreError,
    domain::{
        errors::ArchiveError,
        value_objects::{BucketName, ObjectName},
    },
};

/// `<Error>` document returned by S3-compatible servers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

/// Build a `StoreError::S3` from a failed response.
///
/// HEAD responses carry no body, so the status text stands in for the code.
pub(crate) fn parse_error(status: u16, body: &str) -> StoreError {
    if body.trim().is_empty() {
        return StoreError::S3 {
            status,
            code: fallback_code(status).to_string(),
            message: String::new(),
        };
    }

    match from_str::<ErrorBody>(body) {
        Ok(parsed) => StoreError::S3 {
            status,
            code: parsed.code,
            message: parsed.message.unwrap_or_default(),
        },
        Err(e) => StoreError::Xml(format!("status {status}: {e}")),
    }
}

/// Some operations (CopyObject) answer 200 and put the failure in the body
pub(crate) fn embedded_error(status: u16, body: &str) -> Option<StoreError> {
    if !body.contains("<Error>") {
        return None;
    }
    Some(parse_error(status, body))
}

fn fallback_code(status: u16) -> &'static str {
    match status {
        403 => "AccessDenied",
        404 => "NotFound",
        409 => "Conflict",
        _ => "UnknownError",
    }
}

/// Translate an S3 failure into the archive error a caller expects
pub(crate) fn into_archive_error(
    err: StoreError,
    bucket: &BucketName,
    name: Option<&ObjectName>,
) -> ArchiveError {
    let StoreError::S3 { code, .. } = &err else {
        return err.into();
    };

    match (code.as_str(), name) {
        ("NoSuchBucket", _) => ArchiveError::BucketNotFound {
            bucket: bucket.clone(),
        },
        ("NoSuchKey", Some(name)) => ArchiveError::FileNotFound {
            bucket: bucket.clone(),
            name: name.clone(),
        },
        ("BucketAlreadyOwnedByYou" | "BucketAlreadyExists", _) => {
            ArchiveError::BucketAlreadyExists {
                bucket: bucket.clone(),
            }
        }
        ("BucketNotEmpty", _) => ArchiveError::BucketNotEmpty {
            bucket: bucket.clone(),
        },
        _ => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> BucketName {
        BucketName::new("song-7".to_string()).unwrap()
    }

    #[test]
    fn test_parse_error_document() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message><BucketName>song-7</BucketName><RequestId>1</RequestId></Error>"#;

        match parse_error(404, body) {
            StoreError::S3 {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, "NoSuchBucket");
                assert_eq!(message, "The specified bucket does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_uses_status() {
        assert!(matches!(
            parse_error(403, ""),
            StoreError::S3 { code, .. } if code == "AccessDenied"
        ));
    }

    #[test]
    fn test_code_mapping() {
        let name = ObjectName::new("a.txt".to_string()).unwrap();
        let s3 = |code: &str, status| StoreError::S3 {
            status,
            code: code.to_string(),
            message: String::new(),
        };

        assert!(matches!(
            into_archive_error(s3("NoSuchBucket", 404), &bucket(), None),
            ArchiveError::BucketNotFound { .. }
        ));
        assert!(matches!(
            into_archive_error(s3("NoSuchKey", 404), &bucket(), Some(&name)),
            ArchiveError::FileNotFound { .. }
        ));
        assert!(matches!(
            into_archive_error(s3("BucketAlreadyOwnedByYou", 409), &bucket(), None),
            ArchiveError::BucketAlreadyExists { .. }
        ));
        assert!(matches!(
            into_archive_error(s3("BucketNotEmpty", 409), &bucket(), None),
            ArchiveError::BucketNotEmpty { .. }
        ));
        assert!(matches!(
            into_archive_error(s3("SlowDown", 503), &bucket(), None),
            ArchiveError::ServiceError {
                status: Some(503),
                ..
            }
        ));
    }

    #[test]
    fn test_embedded_copy_error() {
        assert!(embedded_error(200, "<CopyObjectResult><ETag>x</ETag></CopyObjectResult>").is_none());
        assert!(embedded_error(200, "<Error><Code>InternalError</Code></Error>").is_some());
    }
}
