//! Crate error type.

use ipnet::IpNet;
use thiserror::Error;

/// Result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the CIDR and filtering utilities.
///
/// Lookup misses on [`PrefixMap`](crate::PrefixMap) are expected outcomes and
/// are expressed as `Option`/`bool` results, never as errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested host number falls outside the prefix.
    #[error("host number {number} is out of range for {prefix}")]
    HostOutOfRange {
        /// The prefix the host number was resolved against.
        prefix: IpNet,
        /// The requested host number.
        number: u128,
    },

    /// The operating system failed to produce random bytes.
    #[error("failed to read system entropy: {0}")]
    Entropy(#[from] rand::Error),

    /// An unknown network family selector string.
    #[error("unknown network selector {0:?} (expected \"ip\", \"ip4\" or \"ip6\")")]
    InvalidNetwork(String),
}
