mod archive_service_impl;

pub use archive_service_impl::{ArchiveServiceBuilder, ArchiveServiceImpl, ServiceSettings};
