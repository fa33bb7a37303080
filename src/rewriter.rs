//! In-place substitution of MAC and IPv4 addresses in captured frames.
//!
//! All positions are computed from a single [`FrameLayout`] per frame.
//! Every write overwrites a field of the same size, the frame is never resized.
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

use log::{trace, warn};
use pnet::packet::arp::ArpPacket;
use pnet::packet::ethernet::EtherTypes;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::util::MacAddr;

use crate::address::Substitution;
use crate::error::{Error, Result};
use crate::frame::{classify, read_u16, FrameKind, FrameLayout};
use crate::matcher::fields_equal;
use crate::models::CapturedPacket;
use crate::timestamp::DateOffset;

// Ethernet header
const ETHERNET_DESTINATION: usize = 0;
const ETHERNET_SOURCE: usize = 6;

// ARP body, relative to the start of the network layer
const ARP_SIZE: usize = ArpPacket::minimum_packet_size();
const ARP_PROTOCOL_TYPE: usize = 2;
const ARP_SENDER_HW_ADDR: usize = 8;
const ARP_SENDER_PROTO_ADDR: usize = 14;
const ARP_TARGET_HW_ADDR: usize = 18;
const ARP_TARGET_PROTO_ADDR: usize = 24;

// IPv4 header, relative to the start of the network layer
const IPV4_HEADER_SIZE: usize = Ipv4Packet::minimum_packet_size();
const IPV4_SOURCE: usize = 12;
const IPV4_DESTINATION: usize = 16;
/// Version 4 with a five-word header, i.e. no options.
const IPV4_VERSION_IHL_NO_OPTIONS: u8 = 0x45;

/// Number of fields overwritten in a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rewrites {
    pub mac: u64,
    pub ipv4: u64,
}

fn ensure_length(frame: &[u8], needed: usize) -> Result<()> {
    if frame.len() < needed {
        return Err(Error::FrameTooShort {
            needed,
            have: frame.len(),
        });
    }
    Ok(())
}

/// Overwrite the field at `start` with `new` if it currently holds `old`.
fn replace_field(frame: &mut [u8], start: usize, old: &[u8], new: &[u8]) -> Result<bool> {
    let have = frame.len();
    let needed = start + old.len();
    let field = frame
        .get_mut(start..needed)
        .ok_or(Error::FrameTooShort { needed, have })?;
    if fields_equal(field, old) {
        field.copy_from_slice(new);
        Ok(true)
    } else {
        Ok(false)
    }
}

fn replace_mac(
    frame: &mut [u8],
    start: usize,
    mac: &Substitution<MacAddr>,
    name: &str,
) -> Result<u64> {
    if replace_field(frame, start, &mac.old_octets(), &mac.new_octets())? {
        trace!("rewrite field={} {}", name, mac);
        return Ok(1);
    }
    Ok(0)
}

fn replace_ipv4(
    frame: &mut [u8],
    start: usize,
    ipv4: &Substitution<Ipv4Addr>,
    name: &str,
) -> Result<u64> {
    if replace_field(frame, start, &ipv4.old_octets(), &ipv4.new_octets())? {
        trace!("rewrite field={} {}", name, ipv4);
        return Ok(1);
    }
    Ok(0)
}

/// Replace the destination and source MAC addresses of the Ethernet header.
///
/// This is done regardless of the payload type, and the two addresses are
/// checked independently.
pub fn rewrite_ethernet(frame: &mut [u8], mac: &Substitution<MacAddr>) -> Result<u64> {
    ensure_length(frame, ETHERNET_SOURCE + 6)?;
    Ok(replace_mac(frame, ETHERNET_DESTINATION, mac, "eth.dst")?
        + replace_mac(frame, ETHERNET_SOURCE, mac, "eth.src")?)
}

/// Replace the hardware and (for IPv4 over ARP) protocol addresses of an ARP body.
///
/// Does nothing if the frame does not carry ARP.
pub fn rewrite_arp(
    frame: &mut [u8],
    layout: &FrameLayout,
    mac: Option<&Substitution<MacAddr>>,
    ipv4: Option<&Substitution<Ipv4Addr>>,
) -> Result<Rewrites> {
    let mut rewrites = Rewrites::default();
    if !layout.is_arp() || (mac.is_none() && ipv4.is_none()) {
        return Ok(rewrites);
    }
    let arp = layout.network_start();
    ensure_length(frame, arp + ARP_SIZE)?;

    if let Some(mac) = mac {
        rewrites.mac += replace_mac(frame, arp + ARP_SENDER_HW_ADDR, mac, "arp.src.hw_mac")?;
        rewrites.mac += replace_mac(frame, arp + ARP_TARGET_HW_ADDR, mac, "arp.dst.hw_mac")?;
    }

    if let Some(ipv4) = ipv4 {
        if read_u16(frame, arp + ARP_PROTOCOL_TYPE)? == EtherTypes::Ipv4.0 {
            rewrites.ipv4 +=
                replace_ipv4(frame, arp + ARP_SENDER_PROTO_ADDR, ipv4, "arp.src.proto_ipv4")?;
            rewrites.ipv4 +=
                replace_ipv4(frame, arp + ARP_TARGET_PROTO_ADDR, ipv4, "arp.dst.proto_ipv4")?;
        }
    }

    Ok(rewrites)
}

/// Return true if the frame carries an IPv4 header without options.
pub fn has_plain_ipv4_header(frame: &[u8], layout: &FrameLayout) -> bool {
    layout.is_ipv4() && frame.get(layout.network_start()) == Some(&IPV4_VERSION_IHL_NO_OPTIONS)
}

/// Replace the source and destination addresses of an IPv4 header.
///
/// Headers carrying options are not recognized and are left as is.
pub fn rewrite_ipv4(
    frame: &mut [u8],
    layout: &FrameLayout,
    ipv4: &Substitution<Ipv4Addr>,
) -> Result<u64> {
    if !has_plain_ipv4_header(frame, layout) {
        return Ok(0);
    }
    let ip = layout.network_start();
    ensure_length(frame, ip + IPV4_HEADER_SIZE)?;
    Ok(replace_ipv4(frame, ip + IPV4_SOURCE, ipv4, "ip.src")?
        + replace_ipv4(frame, ip + IPV4_DESTINATION, ipv4, "ip.dst")?)
}

/// Apply the ARP and IPv4 substitutions to an already classified frame.
///
/// All the lengths required by the substitutions are checked before the
/// first write, so a payload that is too short is returned untouched.
pub fn rewrite_payload(
    frame: &mut [u8],
    layout: &FrameLayout,
    mac: Option<&Substitution<MacAddr>>,
    ipv4: Option<&Substitution<Ipv4Addr>>,
) -> Result<Rewrites> {
    let network = layout.network_start();
    if layout.is_arp() && (mac.is_some() || ipv4.is_some()) {
        ensure_length(frame, network + ARP_SIZE)?;
    }
    if ipv4.is_some() && has_plain_ipv4_header(frame, layout) {
        ensure_length(frame, network + IPV4_HEADER_SIZE)?;
    }

    let mut rewrites = rewrite_arp(frame, layout, mac, ipv4)?;
    if let Some(ipv4) = ipv4 {
        rewrites.ipv4 += rewrite_ipv4(frame, layout, ipv4)?;
    }
    Ok(rewrites)
}

/// Apply every requested substitution to an already classified frame.
///
/// The Ethernet addresses are rewritten first, even if the payload turns out
/// to be too short, in which case the payload is left untouched and
/// [`Error::FrameTooShort`] is returned.
pub fn rewrite_fields(
    frame: &mut [u8],
    layout: &FrameLayout,
    mac: Option<&Substitution<MacAddr>>,
    ipv4: Option<&Substitution<Ipv4Addr>>,
) -> Result<Rewrites> {
    let mut rewrites = Rewrites::default();
    if let Some(mac) = mac {
        rewrites.mac += rewrite_ethernet(frame, mac)?;
    }
    let payload = rewrite_payload(frame, layout, mac, ipv4)?;
    rewrites.mac += payload.mac;
    rewrites.ipv4 += payload.ipv4;
    Ok(rewrites)
}

/// Classify a frame and apply every requested substitution.
pub fn rewrite_frame(
    frame: &mut [u8],
    mac: Option<&Substitution<MacAddr>>,
    ipv4: Option<&Substitution<Ipv4Addr>>,
) -> Result<(FrameLayout, Rewrites)> {
    let layout = classify(frame)?;
    let rewrites = rewrite_fields(frame, &layout, mac, ipv4)?;
    Ok((layout, rewrites))
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct RunCounters {
    /// Number of packets processed.
    pub total: u64,
    pub arp: u64,
    pub dot1q: u64,
    pub qinq: u64,
    /// Number of packets whose payload was written unmodified because a field was out of bounds.
    pub malformed: u64,
    /// Number of MAC address fields overwritten.
    pub mac_rewrites: u64,
    /// Number of IPv4 address fields overwritten.
    pub ipv4_rewrites: u64,
}

impl RunCounters {
    fn record_layout(&mut self, layout: &FrameLayout) {
        match layout.kind {
            FrameKind::Untagged => {}
            FrameKind::Dot1Q => self.dot1q += 1,
            FrameKind::QinQ => self.qinq += 1,
        }
        if layout.is_arp() {
            self.arp += 1;
        }
    }

    fn record_rewrites(&mut self, rewrites: &Rewrites) {
        self.mac_rewrites += rewrites.mac;
        self.ipv4_rewrites += rewrites.ipv4;
    }
}

impl Display for RunCounters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "packets={}", self.total)?;
        write!(f, " arp={}", self.arp)?;
        write!(f, " dot1q={}", self.dot1q)?;
        write!(f, " qinq={}", self.qinq)?;
        write!(f, " malformed={}", self.malformed)?;
        write!(f, " mac_rewrites={}", self.mac_rewrites)?;
        write!(f, " ipv4_rewrites={}", self.ipv4_rewrites)
    }
}

/// Rewrites packets one at a time with a fixed set of substitutions.
pub struct PacketRewriter {
    mac: Option<Substitution<MacAddr>>,
    ipv4: Option<Substitution<Ipv4Addr>>,
    date_offset: DateOffset,
    counters: RunCounters,
}

impl PacketRewriter {
    pub fn new(
        mac: Option<Substitution<MacAddr>>,
        ipv4: Option<Substitution<Ipv4Addr>>,
        date_offset: DateOffset,
    ) -> Self {
        PacketRewriter {
            mac,
            ipv4,
            date_offset,
            counters: RunCounters::default(),
        }
    }

    /// Rebase the timestamp and rewrite the addresses of a packet.
    ///
    /// The Ethernet addresses are rewritten whenever the frame holds them.
    /// Frames too short for the other substitutions are counted as malformed
    /// and their payload is left unmodified; this never fails.
    pub fn process(&mut self, packet: &mut CapturedPacket) {
        self.counters.total += 1;

        if !self.date_offset.is_noop() {
            match self.date_offset.apply(packet.timestamp) {
                Ok(timestamp) => packet.timestamp = timestamp,
                Err(error) => warn!("packet={} {}", self.counters.total, error),
            }
        }

        if let Some(mac) = &self.mac {
            match rewrite_ethernet(&mut packet.data, mac) {
                Ok(count) => self.counters.mac_rewrites += count,
                Err(error) => {
                    warn!("packet={} {}", self.counters.total, error);
                    self.counters.malformed += 1;
                    return;
                }
            }
        }

        let layout = match classify(&packet.data) {
            Ok(layout) => layout,
            Err(error) => {
                warn!("packet={} {}", self.counters.total, error);
                self.counters.malformed += 1;
                return;
            }
        };
        self.counters.record_layout(&layout);

        match rewrite_payload(
            &mut packet.data,
            &layout,
            self.mac.as_ref(),
            self.ipv4.as_ref(),
        ) {
            Ok(rewrites) => self.counters.record_rewrites(&rewrites),
            Err(error) => {
                warn!("packet={} kind={} {}", self.counters.total, layout.kind, error);
                self.counters.malformed += 1;
            }
        }
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }
}
