//! Parsing and formatting of user-supplied addresses.
//!
//! An empty string means "no substitution requested" and parses to `None`.
//!
//! ```
//! use rewritecap::address::{format_mac, parse_mac, Substitution};
//!
//! let mac = parse_mac("aa-bb-cc-dd-ee-ff").unwrap().unwrap();
//! assert_eq!(format_mac(mac), "AA:BB:CC:DD:EE:FF");
//! assert_eq!(parse_mac("").unwrap(), None);
//!
//! let pair = Substitution::from_ipv4_strings("10.0.0.1", "192.0.2.1").unwrap();
//! assert!(pair.is_some());
//! ```
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

use log::debug;
use pnet::util::MacAddr;

use crate::error::{Error, Result};

/// The octets of a MAC address, in wire order.
pub fn mac_octets(mac: MacAddr) -> [u8; 6] {
    let MacAddr(a, b, c, d, e, f) = mac;
    [a, b, c, d, e, f]
}

/// Parse a MAC address written as six hex octets separated by `:` or `-`.
pub fn parse_mac(text: &str) -> Result<Option<MacAddr>> {
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || Error::InvalidMacAddress(text.to_string());
    let separator = if text.contains(':') { ':' } else { '-' };
    let parts: Vec<&str> = text.split(separator).collect();
    if parts.len() != 6 {
        return Err(invalid());
    }
    let mut octets = [0u8; 6];
    for (octet, part) in octets.iter_mut().zip(parts) {
        if part.len() != 2 {
            return Err(invalid());
        }
        *octet = hex::decode(part).map_err(|_| invalid())?[0];
    }
    let [a, b, c, d, e, f] = octets;
    Ok(Some(MacAddr::new(a, b, c, d, e, f)))
}

/// Parse an IPv4 address in dotted-quad notation.
pub fn parse_ipv4(text: &str) -> Result<Option<Ipv4Addr>> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<Ipv4Addr>()
        .map(Some)
        .map_err(|_| Error::InvalidIpv4Address(text.to_string()))
}

/// Format a MAC address as uppercase hex octets separated by `:`.
pub fn format_mac(mac: MacAddr) -> String {
    mac_octets(mac)
        .iter()
        .map(|octet| hex::encode_upper([*octet]))
        .collect::<Vec<_>>()
        .join(":")
}

/// An address to look for and the address that replaces it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Substitution<T> {
    pub old: T,
    pub new: T,
}

impl<T> Substitution<T> {
    pub fn new(old: T, new: T) -> Self {
        Substitution { old, new }
    }

    /// Pair two optional addresses, which must be both present or both absent.
    fn pair(
        old: Option<T>,
        new: Option<T>,
        old_name: &'static str,
        new_name: &'static str,
    ) -> Result<Option<Self>> {
        match (old, new) {
            (Some(old), Some(new)) => Ok(Some(Substitution { old, new })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::IncompleteSubstitution {
                given: old_name,
                missing: new_name,
            }),
            (None, Some(_)) => Err(Error::IncompleteSubstitution {
                given: new_name,
                missing: old_name,
            }),
        }
    }
}

impl Substitution<MacAddr> {
    pub fn from_mac_strings(old: &str, new: &str) -> Result<Option<Self>> {
        let pair = Self::pair(parse_mac(old)?, parse_mac(new)?, "mac", "newmac")?;
        if let Some(mac) = &pair {
            debug!("mac={}", mac);
        }
        Ok(pair)
    }

    pub fn old_octets(&self) -> [u8; 6] {
        mac_octets(self.old)
    }

    pub fn new_octets(&self) -> [u8; 6] {
        mac_octets(self.new)
    }
}

impl Substitution<Ipv4Addr> {
    pub fn from_ipv4_strings(old: &str, new: &str) -> Result<Option<Self>> {
        let pair = Self::pair(parse_ipv4(old)?, parse_ipv4(new)?, "ip4", "newip4")?;
        if let Some(ipv4) = &pair {
            debug!("ipv4={}", ipv4);
        }
        Ok(pair)
    }

    pub fn old_octets(&self) -> [u8; 4] {
        self.old.octets()
    }

    pub fn new_octets(&self) -> [u8; 4] {
        self.new.octets()
    }
}

impl Display for Substitution<MacAddr> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", format_mac(self.old), format_mac(self.new))
    }
}

impl Display for Substitution<Ipv4Addr> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.old, self.new)
    }
}
