/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    // ObjectName validation errors
    EmptyObjectName,
    ObjectNameTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectNameCharacter(char),
    ObjectNameStartsWithSlash,
    ObjectNameEndsWithSlash,
    ObjectNameContainsDoubleSlash,
    ObjectNameDotSegment,
    ObjectNameNotAStoreKey(String),

    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutiveHyphens,
    BucketNameReserved(&'static str),

    // Archive identifier normalization errors
    EmptyIdentifier,
    IdentifierHasNoUsableCharacters,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectName errors
            ValidationError::EmptyObjectName => write!(f, "File name cannot be empty"),
            ValidationError::ObjectNameTooLong { actual, max } => {
                write!(f, "File name too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectNameCharacter(c) => {
                write!(f, "Invalid character in file name: {:?}", c)
            }
            ValidationError::ObjectNameStartsWithSlash => {
                write!(f, "File name cannot start with '/'")
            }
            ValidationError::ObjectNameEndsWithSlash => {
                write!(f, "File name cannot end with '/'")
            }
            ValidationError::ObjectNameContainsDoubleSlash => {
                write!(f, "File name cannot contain '//'")
            }
            ValidationError::ObjectNameDotSegment => {
                write!(f, "File name cannot contain '.' or '..' path segments")
            }
            ValidationError::ObjectNameNotAStoreKey(reason) => {
                write!(f, "File name is not a valid store key: {}", reason)
            }

            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, and hyphens allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutiveHyphens => {
                write!(f, "Bucket name cannot contain consecutive hyphens")
            }
            ValidationError::BucketNameReserved(form) => {
                write!(f, "Bucket name uses the reserved form '{}'", form)
            }

            // Identifier errors
            ValidationError::EmptyIdentifier => write!(f, "Archive identifier cannot be empty"),
            ValidationError::IdentifierHasNoUsableCharacters => {
                write!(
                    f,
                    "Archive identifier contains no letters or digits to build a bucket name from"
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
