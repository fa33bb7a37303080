use chrono::{DateTime, Utc};
use pcap::PacketHeader;

use crate::error::{Error, Result};

/// A captured frame, owned so that it can be modified in place.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedPacket {
    /// The capture timestamp.
    pub timestamp: DateTime<Utc>,
    /// The length of the frame on the wire, which may exceed `data.len()`
    /// if the capture was truncated to the snapshot length.
    pub original_length: u32,
    /// The captured bytes, starting at the Ethernet header.
    pub data: Vec<u8>,
}

impl CapturedPacket {
    pub fn new(timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        CapturedPacket {
            timestamp,
            original_length: data.len() as u32,
            data,
        }
    }

    /// Copy a packet read by pcap.
    pub fn from_pcap(packet: &pcap::Packet) -> Result<Self> {
        let nanos = packet.header.ts.tv_usec as i64 * 1_000;
        let timestamp = u32::try_from(nanos)
            .ok()
            .and_then(|nanos| DateTime::from_timestamp(packet.header.ts.tv_sec as i64, nanos))
            .ok_or(Error::TimestampOutOfRange)?;
        Ok(CapturedPacket {
            timestamp,
            original_length: packet.header.len,
            data: packet.data.to_vec(),
        })
    }

    /// Build the pcap header for this packet from the header it was read with.
    ///
    /// The captured and original lengths are kept, only the timestamp changes.
    pub fn pcap_header(&self, original: &PacketHeader) -> PacketHeader {
        let mut header = *original;
        header.ts.tv_sec = self.timestamp.timestamp() as _;
        header.ts.tv_usec = self.timestamp.timestamp_subsec_micros() as _;
        header
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::models::CapturedPacket;

    #[test]
    fn test_new_packet_length() {
        let timestamp = Utc.with_ymd_and_hms(2014, 6, 1, 12, 0, 0).unwrap();
        let packet = CapturedPacket::new(timestamp, vec![0u8; 60]);
        assert_eq!(packet.original_length, 60);
        assert_eq!(packet.data.len(), 60);
    }
}
