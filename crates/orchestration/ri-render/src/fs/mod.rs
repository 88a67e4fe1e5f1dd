//! Output filesystems receiving rendered index files.

mod local;
mod memory;
mod s3;
mod scoped;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use s3::{S3OutputConfig, S3OutputFs, content_type};
pub use scoped::ScopedFs;
