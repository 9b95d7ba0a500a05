pub mod archive;
pub mod object;

pub use archive::*;
pub use object::*;
