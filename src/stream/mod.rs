//! Result streaming: cursor adapters over native pull-iterators and the
//! bridge that drains them onto bounded channels.

mod bridge;
pub(crate) mod cursor;

pub use bridge::ItemStream;
pub(crate) use bridge::stream;
