//! High-level interface for rewriting capture files.
//!
//! ```no_run
//! use rewritecap::address::Substitution;
//! use rewritecap::easy::{rewrite_file, Config};
//!
//! let config = Config {
//!     input_file: "capture.pcap".into(),
//!     output_file: "capture-rewritten.pcap".into(),
//!     ipv4: Substitution::from_ipv4_strings("10.0.0.1", "192.0.2.1").unwrap(),
//!     ..Default::default()
//! };
//! let counters = rewrite_file(config).unwrap();
//!
//! println!("{}", counters);
//! ```
use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use pcap::{Capture, Linktype, Packet};
use pnet::util::MacAddr;

use crate::address::Substitution;
use crate::logger::StatisticsLogger;
use crate::models::CapturedPacket;
use crate::rewriter::{PacketRewriter, RunCounters};
use crate::timestamp::{DateOffset, TargetDate};

/// Rewrite a capture file into a new one.
///
/// Packets are read, modified and written one at a time, in their original order.
/// The output has the same link type and snapshot length as the input.
pub fn rewrite_file(config: Config) -> Result<RunCounters> {
    info!("{}", config);

    let date_offset = date_offset(&config)?;
    debug!("date_offset={:?}", date_offset);

    let mut cap = Capture::from_file(&config.input_file)
        .with_context(|| format!("Cannot open {}", config.input_file.display()))?;
    let linktype = cap.get_datalink();
    if linktype != Linktype::ETHERNET {
        bail!(
            "Unsupported link type: {} ({})",
            linktype.get_name().unwrap_or_default(),
            linktype.0
        );
    }

    let mut savefile = cap
        .savefile(&config.output_file)
        .with_context(|| format!("Cannot create {}", config.output_file.display()))?;

    let mut rewriter = PacketRewriter::new(config.mac, config.ipv4, date_offset);
    let mut logger = StatisticsLogger::new(config.progress_interval);

    loop {
        match cap.next_packet() {
            Ok(packet) => {
                let mut captured = CapturedPacket::from_pcap(&packet)?;
                rewriter.process(&mut captured);
                let header = captured.pcap_header(packet.header);
                savefile.write(&Packet::new(&header, &captured.data));
                logger.tick(rewriter.counters());
            }
            Err(pcap::Error::NoMorePackets) => break,
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("Cannot read {}", config.input_file.display())
                })
            }
        }
    }

    savefile
        .flush()
        .with_context(|| format!("Cannot write {}", config.output_file.display()))?;
    logger.stop(rewriter.counters());

    Ok(*rewriter.counters())
}

/// Compute the timestamp offset, reading the first packet only if a date change is requested.
fn date_offset(config: &Config) -> Result<DateOffset> {
    if config.target_date.is_unchanged() {
        return Ok(DateOffset {
            duration: config.time_shift,
            ..Default::default()
        });
    }
    match first_packet_timestamp(&config.input_file)? {
        Some(first) => {
            debug!("first_packet_timestamp={}", first);
            Ok(DateOffset::between(
                first,
                config.target_date,
                config.time_shift,
            ))
        }
        None => Ok(DateOffset::default()),
    }
}

/// Return the timestamp of the first packet of a capture file, if any.
pub fn first_packet_timestamp(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let mut cap =
        Capture::from_file(path).with_context(|| format!("Cannot open {}", path.display()))?;
    match cap.next_packet() {
        Ok(packet) => Ok(Some(CapturedPacket::from_pcap(&packet)?.timestamp)),
        Err(pcap::Error::NoMorePackets) => Ok(None),
        Err(error) => Err(error).with_context(|| format!("Cannot read {}", path.display())),
    }
}

/// Rewriting configuration.
pub struct Config {
    /// Capture file to read from.
    pub input_file: PathBuf,
    /// Capture file to write to.
    pub output_file: PathBuf,
    /// MAC address to replace, and its replacement.
    pub mac: Option<Substitution<MacAddr>>,
    /// IPv4 address to replace, and its replacement.
    pub ipv4: Option<Substitution<Ipv4Addr>>,
    /// Date to move the first packet to (0 = unchanged, per component).
    pub target_date: TargetDate,
    /// Fixed duration added to every timestamp.
    pub time_shift: Option<chrono::Duration>,
    /// Interval between two progress logs.
    pub progress_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_file: PathBuf::new(),
            output_file: PathBuf::new(),
            mac: None,
            ipv4: None,
            target_date: TargetDate::default(),
            time_shift: None,
            progress_interval: Duration::from_secs(5),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "input_file={:?}", self.input_file)?;
        write!(f, " output_file={:?}", self.output_file)?;
        match &self.mac {
            Some(mac) => write!(f, " mac={}", mac)?,
            None => write!(f, " mac=None")?,
        }
        match &self.ipv4 {
            Some(ipv4) => write!(f, " ipv4={}", ipv4)?,
            None => write!(f, " ipv4=None")?,
        }
        write!(
            f,
            " target_date={:04}-{:02}-{:02}",
            self.target_date.year, self.target_date.month, self.target_date.day
        )?;
        write!(f, " time_shift={:?}", self.time_shift)?;
        write!(f, " progress_interval={:?}", self.progress_interval)
    }
}

#[cfg(test)]
mod tests {
    use pnet::util::MacAddr;

    use crate::address::Substitution;
    use crate::easy::Config;
    use crate::timestamp::TargetDate;

    #[test]
    fn test_config_display() {
        let config = Config {
            input_file: "in.pcap".into(),
            output_file: "out.pcap".into(),
            mac: Some(Substitution::new(
                MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
                MacAddr::new(0x11, 0x22, 0x33, 0x44, 0x55, 0x66),
            )),
            target_date: TargetDate {
                year: 2020,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.to_string(),
            "input_file=\"in.pcap\" output_file=\"out.pcap\" \
             mac=AA:BB:CC:DD:EE:FF->11:22:33:44:55:66 ipv4=None \
             target_date=2020-00-00 time_shift=None progress_interval=5s"
        );
    }
}
