pub mod buffer;
pub mod codec;
pub mod disk;
pub mod page;
