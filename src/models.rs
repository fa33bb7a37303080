//! Data structures for representing captured packets.
mod packet;

pub use packet::*;
