//! Address-family filtering.

use std::net::IpAddr;
use std::str::FromStr;

use crate::error::Error;

/// Network family selector, parsed from the conventional `"ip"`, `"ip4"`,
/// `"ip6"` strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Both families.
    Ip,
    /// IPv4 only.
    Ipv4,
    /// IPv6 only.
    Ipv6,
}

impl Network {
    /// Whether `addr` belongs to this family.
    #[inline]
    pub fn matches(self, addr: &IpAddr) -> bool {
        match self {
            Network::Ip => true,
            Network::Ipv4 => addr.is_ipv4(),
            Network::Ipv6 => addr.is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "ip" => Ok(Network::Ip),
            "ip4" => Ok(Network::Ipv4),
            "ip6" => Ok(Network::Ipv6),
            other => Err(Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// Returns the addresses matching the given network family, in input order.
pub fn filter_by_network(addrs: &[IpAddr], network: Network) -> Vec<IpAddr> {
    addrs
        .iter()
        .copied()
        .filter(|addr| network.matches(addr))
        .collect()
}
