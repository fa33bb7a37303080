#![doc = include_str!("../README.md")]

pub mod address;
pub mod easy;
pub mod error;
pub mod frame;
pub mod logger;
pub mod matcher;
pub mod models;
pub mod rewriter;
pub mod timestamp;
pub mod utilities;

pub use address::*;
pub use error::*;
pub use frame::*;
pub use rewriter::*;
