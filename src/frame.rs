//! Classification of Ethernet frames by VLAN tagging.
//!
//! VLAN tags are inserted between the source MAC address and the EtherType,
//! so the MAC addresses never move while every field from byte 12 onwards is
//! shifted by the size of the tags.
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use strum::Display;

use crate::error::{Error, Result};

/// Offset of the EtherType (or TPID) in an untagged frame.
pub const ETHERTYPE_OFFSET: usize = 12;

/// Size of an untagged Ethernet header.
pub const ETHERNET_HEADER_SIZE: usize = EthernetPacket::minimum_packet_size();

/// Size of a single 802.1Q tag.
pub const VLAN_TAG_SIZE: usize = 4;

/// Link-layer framing variant.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum FrameKind {
    #[strum(serialize = "untagged")]
    Untagged,
    /// A single 802.1Q tag (TPID 0x8100).
    #[strum(serialize = "802.1q")]
    Dot1Q,
    /// Two stacked tags (TPID 0x88a8).
    #[strum(serialize = "qinq")]
    QinQ,
}

impl FrameKind {
    /// Number of tag bytes preceding the EtherType.
    pub fn offset(&self) -> usize {
        match self {
            FrameKind::Untagged => 0,
            FrameKind::Dot1Q => VLAN_TAG_SIZE,
            FrameKind::QinQ => 2 * VLAN_TAG_SIZE,
        }
    }
}

/// The positions of a frame's link-layer fields, computed once per packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub kind: FrameKind,
    /// The EtherType found after the tags.
    pub ethertype: EtherType,
}

impl FrameLayout {
    /// Number of tag bytes preceding the EtherType.
    pub fn offset(&self) -> usize {
        self.kind.offset()
    }

    /// Index of the first byte of the network layer (the link-layer payload).
    pub fn network_start(&self) -> usize {
        ETHERNET_HEADER_SIZE + self.offset()
    }

    pub fn is_arp(&self) -> bool {
        self.ethertype == EtherTypes::Arp
    }

    pub fn is_ipv4(&self) -> bool {
        self.ethertype == EtherTypes::Ipv4
    }
}

/// Read the big-endian 16-bit value at `index`.
pub(crate) fn read_u16(frame: &[u8], index: usize) -> Result<u16> {
    frame
        .get(index..index + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or(Error::FrameTooShort {
            needed: index + 2,
            have: frame.len(),
        })
}

/// Determine the tagging of a frame from the TPID at byte 12.
///
/// Only one level is inspected: a QinQ frame is not scanned for a third tag.
pub fn classify(frame: &[u8]) -> Result<FrameLayout> {
    let kind = match EtherType(read_u16(frame, ETHERTYPE_OFFSET)?) {
        EtherTypes::Vlan => FrameKind::Dot1Q,
        EtherTypes::PBridge => FrameKind::QinQ,
        _ => FrameKind::Untagged,
    };
    let ethertype = EtherType(read_u16(frame, ETHERTYPE_OFFSET + kind.offset())?);
    Ok(FrameLayout { kind, ethertype })
}
