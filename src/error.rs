//! Error types for the packet rewriting core.
//!
//! The capture driver and the CLI use [`anyhow`]; everything below it returns
//! [`enum@Error`] so that callers can tell a malformed frame apart from bad input.
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// The text is neither empty nor six colon/hyphen separated hex octets.
    #[error("invalid MAC address: {0:?}")]
    InvalidMacAddress(String),

    /// The text is neither empty nor a dotted-quad IPv4 address.
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIpv4Address(String),

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    /// Only one half of an old/new address pair was given.
    #[error("{given} requires {missing}")]
    IncompleteSubstitution {
        given: &'static str,
        missing: &'static str,
    },

    /// The frame ends before a field the rewriter needs.
    #[error("frame too short (need {needed} bytes, have {have})")]
    FrameTooShort { needed: usize, have: usize },

    #[error("timestamp out of range")]
    TimestampOutOfRange,
}

pub type Result<T> = std::result::Result<T, Error>;
