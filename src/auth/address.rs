// SPDX-License-Identifier: Apache-2.0

//! Caller address matching
//!
//! Allow-list entries are either a literal IPv4/IPv6 address or a CIDR block
//! (`literal/prefix`). A candidate is allowed when it equals a literal entry
//! or falls inside a block of the same address family.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use gate_core::{GateError, GateResult};

/// A parsed allow-list address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPattern {
    Exact(IpAddr),
    Cidr { network: IpAddr, prefix_len: u8 },
}

impl AddressPattern {
    /// Parses `literal` or `literal/prefix`.
    ///
    /// The prefix must be within 0..=32 for IPv4 and 0..=128 for IPv6.
    pub fn parse(raw: &str) -> GateResult<Self> {
        let raw = raw.trim();
        match raw.split_once('/') {
            None => raw
                .parse::<IpAddr>()
                .map(AddressPattern::Exact)
                .map_err(|_| GateError::validation("address is not a valid IP literal")),
            Some((network, prefix)) => {
                let network = network
                    .parse::<IpAddr>()
                    .map_err(|_| GateError::validation("CIDR network is not a valid IP literal"))?;
                if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(GateError::validation("CIDR prefix length is not a number"));
                }
                let prefix_len = prefix
                    .parse::<u8>()
                    .map_err(|_| GateError::validation("CIDR prefix length is not a number"))?;
                let max = match network {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                if prefix_len > max {
                    return Err(GateError::validation(format!(
                        "CIDR prefix length must be between 0 and {max}"
                    )));
                }
                Ok(AddressPattern::Cidr {
                    network,
                    prefix_len,
                })
            }
        }
    }

    /// True if `candidate` is this address or inside this block.
    pub fn contains(&self, candidate: IpAddr) -> bool {
        match *self {
            AddressPattern::Exact(addr) => normalize(addr) == normalize(candidate),
            AddressPattern::Cidr {
                network,
                prefix_len,
            } => match (network, normalize(candidate)) {
                (IpAddr::V4(net), IpAddr::V4(ip)) => ipv4_in_block(ip, net, prefix_len),
                (IpAddr::V6(net), IpAddr::V6(ip)) => ipv6_in_block(&ip, &net, prefix_len),
                // Families never match each other.
                _ => false,
            },
        }
    }
}

/// Unwraps IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`), which is how a
/// dual-stack listener reports IPv4 peers.
pub fn normalize(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn ipv4_in_block(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    let mask: u32 = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    };
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_block(ip: &Ipv6Addr, network: &Ipv6Addr, prefix_len: u8) -> bool {
    let ip = ip.octets();
    let network = network.octets();
    let full_bytes = usize::from(prefix_len / 8);
    let remaining_bits = prefix_len % 8;

    if ip[..full_bytes] != network[..full_bytes] {
        return false;
    }
    if remaining_bits == 0 {
        return true;
    }

    let mask: u8 = 0xFF << (8 - remaining_bits);
    (ip[full_bytes] & mask) == (network[full_bytes] & mask)
}

/// Splits a caller address into its trimmed text and parsed, normalized IP.
pub fn candidate(address: &str) -> (&str, Option<IpAddr>) {
    let raw = address.trim();
    (raw, raw.parse::<IpAddr>().ok().map(normalize))
}

/// True if one allow-list entry covers the caller.
///
/// An exact string match wins. Otherwise the entry's parsed pattern decides;
/// a missing pattern or an unparsable candidate never matches.
pub fn entry_covers(
    raw: &str,
    candidate: Option<IpAddr>,
    entry_address: &str,
    pattern: Option<&AddressPattern>,
) -> bool {
    if entry_address == raw {
        return true;
    }
    match (candidate, pattern) {
        (Some(ip), Some(pattern)) => pattern.contains(ip),
        _ => false,
    }
}

/// Returns true if `address` is allowed by any of `allowed`.
pub fn matches<S: AsRef<str>>(address: &str, allowed: &[S]) -> bool {
    let (raw, ip) = candidate(address);

    allowed.iter().any(|entry| {
        let entry = entry.as_ref().trim();
        let pattern = AddressPattern::parse(entry).ok();
        entry_covers(raw, ip, entry, pattern.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ipv4_cidr_containment() {
        assert!(matches("192.168.1.5", &["192.168.1.0/24"]));
        assert!(!matches("192.168.2.5", &["192.168.1.0/24"]));
        assert!(matches("10.200.3.4", &["10.0.0.0/8"]));
        assert!(!matches("11.0.0.1", &["10.0.0.0/8"]));
    }

    #[test]
    fn exact_match() {
        assert!(matches("10.0.0.1", &["10.0.0.1"]));
        assert!(!matches("10.0.0.2", &["10.0.0.1"]));
        assert!(matches("::1", &["0:0:0:0:0:0:0:1"]));
    }

    #[test]
    fn prefix_boundaries() {
        assert!(matches("1.2.3.4", &["0.0.0.0/0"]));
        assert!(matches("255.255.255.255", &["10.0.0.0/0"]));
        assert!(matches("10.0.0.1", &["10.0.0.1/32"]));
        assert!(!matches("10.0.0.2", &["10.0.0.1/32"]));
        assert!(matches("2001:db8::1", &["::/0"]));
        assert!(matches("2001:db8::1", &["2001:db8::1/128"]));
        assert!(!matches("2001:db8::2", &["2001:db8::1/128"]));
    }

    #[test]
    fn ipv6_partial_byte_prefix() {
        // /36 splits the fifth byte: 2001:0db8:a000:: covers a000..afff in group 3
        assert!(matches("2001:db8:afff::1", &["2001:db8:a000::/36"]));
        assert!(!matches("2001:db8:b000::1", &["2001:db8:a000::/36"]));
        assert!(matches("fe80::1234", &["fe80::/10"]));
        assert!(matches("febf::1", &["fe80::/10"]));
        assert!(!matches("fec0::1", &["fe80::/10"]));
    }

    #[test]
    fn families_never_cross() {
        assert!(!matches("10.0.0.1", &["::/0"]));
        assert!(!matches("2001:db8::1", &["0.0.0.0/0"]));
    }

    #[test]
    fn ipv4_mapped_peers_match_ipv4_entries() {
        assert!(matches("::ffff:192.168.1.5", &["192.168.1.0/24"]));
        assert!(matches("::ffff:10.0.0.1", &["10.0.0.1"]));
    }

    #[test]
    fn malformed_input_never_matches() {
        assert!(!matches("not-an-ip", &["10.0.0.0/8"]));
        assert!(!matches("10.0.0.1", &["10.0.0.0/33"]));
        assert!(!matches("10.0.0.1", &["10.0.0.0/abc"]));
        assert!(!matches("10.0.0.1", &[] as &[&str]));
    }

    #[test]
    fn parse_rejects_out_of_range_prefixes() {
        assert!(AddressPattern::parse("10.0.0.0/32").is_ok());
        assert!(AddressPattern::parse("10.0.0.0/33").is_err());
        assert!(AddressPattern::parse("::/128").is_ok());
        assert!(AddressPattern::parse("::/129").is_err());
        assert!(AddressPattern::parse("example.com").is_err());
        assert!(AddressPattern::parse("10.0.0.0/+8").is_err());
        assert!(AddressPattern::parse("10.0.0.0/").is_err());
        assert!(AddressPattern::parse("10.0.0.0/ 8").is_err());
        assert!(!matches("10.9.9.9", &["10.0.0.0/+8"]));
    }

    proptest! {
        #[test]
        fn zero_prefix_matches_every_ipv4(a in any::<u32>(), b in any::<u32>()) {
            let entry = format!("{}/0", Ipv4Addr::from(a));
            prop_assert!(matches(&Ipv4Addr::from(b).to_string(), &[entry]));
        }

        #[test]
        fn full_prefix_matches_only_itself(a in any::<u128>(), b in any::<u128>()) {
            let entry = format!("{}/128", Ipv6Addr::from(a));
            let ip = Ipv6Addr::from(b);
            // Mapped addresses are normalized to IPv4 and leave the v6 family.
            prop_assume!(ip.to_ipv4_mapped().is_none());
            prop_assert_eq!(matches(&ip.to_string(), &[entry]), a == b);
        }

        #[test]
        fn ipv4_block_agrees_with_shifted_comparison(a in any::<u32>(), b in any::<u32>(), prefix in 1u8..=32) {
            let entry = format!("{}/{}", Ipv4Addr::from(a), prefix);
            let shift = 32 - u32::from(prefix);
            let expected = (a >> shift) == (b >> shift);
            prop_assert_eq!(matches(&Ipv4Addr::from(b).to_string(), &[entry]), expected);
        }
    }
}
