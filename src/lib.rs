//! # lpm-rs
//!
//! A longest-prefix-match map from IP prefixes to values, plus the small
//! network utilities that tend to travel with one: a bounded blocking object
//! pool, RFC 4193 unique-local prefix generation, in-prefix host arithmetic,
//! and address-family filtering.
//!
//! The map is a binary trie over address bits with per-family roots, lazy
//! node creation, bottom-up pruning, and value de-duplication, behind a
//! single reader/writer lock.
//!
//! ## Example
//!
//! ```rust
//! use lpm_rs::PrefixMap;
//!
//! let map: PrefixMap<&str> = PrefixMap::new();
//! map.insert("35.180.0.0/16".parse().unwrap(), "eu-west-3");
//! map.insert("52.93.127.173/32".parse().unwrap(), "us-east-1");
//!
//! assert_eq!(map.get("35.180.1.1".parse().unwrap()), Some("eu-west-3"));
//! assert_eq!(map.get("35.250.1.1".parse().unwrap()), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bits;
pub mod cidr;
mod error;
pub mod filter;
mod map;
mod pool;
mod trie;

pub use cidr::{generate_ula, host};
pub use error::{Error, Result};
pub use filter::{filter_by_network, Network};
pub use map::PrefixMap;
pub use pool::WaitPool;

#[cfg(test)]
mod proptests;
