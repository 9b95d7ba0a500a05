use std::str::FromStr;

use crate::domain::value_objects::{BucketName, ObjectName};

/// What `delete_bucket` does when removing one object fails mid-drain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Stop at the first failed deletion and return it
    #[default]
    FailFast,
    /// Attempt every object, then return the first failure (if any)
    /// without removing the bucket
    BestEffort,
}

impl FromStr for DrainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-fast" | "failfast" => Ok(DrainPolicy::FailFast),
            "best-effort" | "besteffort" => Ok(DrainPolicy::BestEffort),
            other => Err(format!(
                "unknown drain policy '{}', expected 'fail-fast' or 'best-effort'",
                other
            )),
        }
    }
}

impl std::fmt::Display for DrainPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrainPolicy::FailFast => write!(f, "fail-fast"),
            DrainPolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Outcome of a successful bucket deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub bucket: BucketName,
    /// Objects removed before the bucket itself
    pub removed: Vec<ObjectName>,
}

/// Outcome of a successful bucket migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub source: BucketName,
    pub target: BucketName,
    pub copied: Vec<ObjectName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_policy_parsing() {
        assert_eq!("fail-fast".parse::<DrainPolicy>(), Ok(DrainPolicy::FailFast));
        assert_eq!("BEST_EFFORT".parse::<DrainPolicy>(), Ok(DrainPolicy::BestEffort));
        assert!("sometimes".parse::<DrainPolicy>().is_err());
        assert_eq!(DrainPolicy::default(), DrainPolicy::FailFast);
    }
}
