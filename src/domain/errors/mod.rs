mod archive_errors;
mod validation_errors;

pub use archive_errors::*;
pub use validation_errors::*;
