pub mod archive_handlers;

pub use archive_handlers::*;
