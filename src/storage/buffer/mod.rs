//! The page buffer: a fixed set of in-memory frames caching disk pages
//! behind a pin/unpin protocol, with clock (second-chance) replacement.
pub mod bufferpool;
pub mod frame;
pub mod page_table;
pub mod replacer;

pub use bufferpool::{BufferPool, BufferPoolManager, PinMode, UnpinMode};
pub use replacer::{ClockReplacer, Replacer};
