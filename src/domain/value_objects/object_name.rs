use crate::domain::errors::ValidationError;

const MAX_LEN: usize = 1024;

/// A validated file (object) name inside an archive bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectName(String);

impl ObjectName {
    /// Create a new ObjectName with validation
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyObjectName);
        }

        if value.len() > MAX_LEN {
            return Err(ValidationError::ObjectNameTooLong {
                actual: value.len(),
                max: MAX_LEN,
            });
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidObjectNameCharacter(c));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectNameStartsWithSlash);
        }

        if value.ends_with('/') {
            return Err(ValidationError::ObjectNameEndsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectNameContainsDoubleSlash);
        }

        if value.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(ValidationError::ObjectNameDotSegment);
        }

        Ok(Self(value))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension after the last '.', lowercased
    pub fn extension(&self) -> Option<String> {
        let file_name = self.0.rsplit('/').next().unwrap_or(&self.0);
        file_name
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ObjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
