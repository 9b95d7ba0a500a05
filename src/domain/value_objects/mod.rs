mod bucket_name;
mod object_name;

pub use bucket_name::BucketName;
pub use object_name::ObjectName;
