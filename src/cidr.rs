//! CIDR helpers: unique-local prefix generation and in-prefix host
//! arithmetic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv6Net};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::bits::AddrBits;
use crate::error::{Error, Result};

/// Generates a random RFC 4193 unique-local IPv6 prefix: `fd` followed by a
/// 40-bit global ID from the OS CSPRNG, as a /48.
pub fn generate_ula() -> Result<Ipv6Net> {
    let mut octets = [0u8; 16];
    octets[0] = 0xfd;
    OsRng.try_fill_bytes(&mut octets[1..6])?;
    Ok(Ipv6Net::new_assert(Ipv6Addr::from(octets), 48))
}

/// Returns the `number`-th host address in `prefix`, counting up from the
/// prefix's own address and rendered in the prefix's family.
///
/// Errors with [`Error::HostOutOfRange`] when the resulting address falls
/// outside the prefix.
pub fn host(prefix: &IpNet, number: u128) -> Result<IpAddr> {
    let out_of_range = || Error::HostOutOfRange {
        prefix: *prefix,
        number,
    };

    let base = AddrBits::new(prefix.addr());
    let sum = base
        .value()
        .checked_add(number)
        .ok_or_else(|| out_of_range())?;

    let addr = match prefix {
        IpNet::V4(_) => {
            let sum = u32::try_from(sum).map_err(|_| out_of_range())?;
            IpAddr::V4(Ipv4Addr::from(sum))
        }
        IpNet::V6(_) => IpAddr::V6(Ipv6Addr::from(sum)),
    };

    if !prefix.contains(&addr) {
        return Err(out_of_range());
    }
    Ok(addr)
}
