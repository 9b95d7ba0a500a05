use crate::domain::errors::ValidationError;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;
const PAD: char = '0';

/// Prefixes S3 reserves for its own bucket names
const RESERVED_PREFIXES: [&str; 3] = ["xn--", "sthree-", "amzn-s3-demo-"];

/// Suffixes S3 reserves for access point aliases and directory buckets
const RESERVED_SUFFIXES: [&str; 4] = ["-s3alias", "--ol-s3", "--x-s3", "--table-s3"];

/// A validated bucket name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketName(String);

impl BucketName {
    /// Create a new BucketName with S3-compatible validation rules
    pub fn new(value: String) -> Result<Self, ValidationError> {
        // Length validation
        if value.len() < MIN_LEN {
            return Err(ValidationError::BucketNameTooShort {
                actual: value.len(),
                min: MIN_LEN,
            });
        }

        if value.len() > MAX_LEN {
            return Err(ValidationError::BucketNameTooLong {
                actual: value.len(),
                max: MAX_LEN,
            });
        }

        // Must start and end with lowercase letter or number
        if !value.chars().next().is_some_and(is_name_char) {
            return Err(ValidationError::BucketNameInvalidStart);
        }

        if !value.chars().last().is_some_and(is_name_char) {
            return Err(ValidationError::BucketNameInvalidEnd);
        }

        // Lowercase, numbers and hyphens only
        if let Some(c) = value.chars().find(|c| !is_name_char(*c) && *c != '-') {
            return Err(ValidationError::BucketNameInvalidCharacter(c));
        }

        if value.contains("--") {
            return Err(ValidationError::BucketNameConsecutiveHyphens);
        }

        if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| value.starts_with(*p)) {
            return Err(ValidationError::BucketNameReserved(*prefix));
        }

        if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| value.ends_with(*s)) {
            return Err(ValidationError::BucketNameReserved(*suffix));
        }

        Ok(Self(value))
    }

    /// Derive the bucket name for an archive identifier.
    ///
    /// Letters are lowercased, every run of other characters collapses into a
    /// single hyphen, hyphens are trimmed from both ends, the result is cut to
    /// 63 characters and names shorter than 3 are left-padded with zeros
    /// (`"7"` becomes `"007"`). A result in a reserved form loses the hyphen
    /// that makes it reserved (`"sthree-x"` becomes `"sthreex"`). The mapping
    /// is deterministic and idempotent: normalizing an already normalized name
    /// returns it unchanged.
    pub fn from_identifier(identifier: &str) -> Result<Self, ValidationError> {
        if identifier.is_empty() {
            return Err(ValidationError::EmptyIdentifier);
        }

        let mut name = String::with_capacity(identifier.len().min(MAX_LEN));
        for c in identifier.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c.to_ascii_lowercase());
            } else if !name.is_empty() && !name.ends_with('-') {
                name.push('-');
            }
        }

        // only ASCII was pushed, so byte and char positions agree
        name.truncate(MAX_LEN);
        let trimmed_len = name.trim_end_matches('-').len();
        name.truncate(trimmed_len);

        if name.is_empty() {
            return Err(ValidationError::IdentifierHasNoUsableCharacters);
        }

        if name.len() < MIN_LEN {
            let padding: String = std::iter::repeat(PAD).take(MIN_LEN - name.len()).collect();
            name.insert_str(0, &padding);
        }

        // Only single-hyphen forms can occur here
        if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(*p)) {
            name.remove(prefix.len() - 1);
        }
        if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
            name.remove(name.len() - suffix.len());
        }

        Self::new(name)
    }

    /// Get the bucket name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
