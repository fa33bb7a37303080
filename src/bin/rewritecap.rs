//! Rewrite MAC addresses, IPv4 addresses and timestamps in a pcap file.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use rewritecap::address::Substitution;
use rewritecap::easy::{rewrite_file, Config};
use rewritecap::timestamp::{parse_duration, TargetDate};
use rewritecap::utilities::configure_logger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Filename of the source pcap file.
    #[arg(short = 'f', long = "file")]
    input_file: PathBuf,
    /// Filename for the new pcap file.
    #[arg(short = 'n', long = "newfile")]
    output_file: PathBuf,
    /// The MAC address to change, in AA:BB:CC:DD:EE:FF format.
    #[arg(long, requires = "new_mac")]
    mac: Option<String>,
    /// The replacement MAC address.
    #[arg(long = "newmac", requires = "mac")]
    new_mac: Option<String>,
    /// The IPv4 address to change, in dotted-quad format.
    #[arg(long = "ip4", requires = "new_ip4")]
    ip4: Option<String>,
    /// The replacement IPv4 address.
    #[arg(long = "newip4", requires = "ip4")]
    new_ip4: Option<String>,
    /// Rebase to year (yyyy), 0 to keep the original year.
    #[arg(short = 'y', long, default_value_t = 0)]
    year: i32,
    /// Rebase to month (mm), 0 to keep the original month.
    #[arg(short = 'm', long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=12))]
    month: u32,
    /// Rebase to day (dd), 0 to keep the original day.
    #[arg(short = 'd', long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=31))]
    day: u32,
    /// Shift every timestamp by a duration, e.g. 1h30m or -45s.
    #[arg(short = 't', long, allow_hyphen_values = true)]
    time: Option<String>,
    /// Seconds between two progress logs.
    #[arg(long, default_value_t = 5)]
    progress_interval: u64,
    /// Minimum log level.
    #[arg(short = 'L', long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    configure_logger(args.log_level);

    // Validate every user-supplied value before touching the capture.
    let mac = Substitution::from_mac_strings(
        args.mac.as_deref().unwrap_or_default(),
        args.new_mac.as_deref().unwrap_or_default(),
    )?;
    let ipv4 = Substitution::from_ipv4_strings(
        args.ip4.as_deref().unwrap_or_default(),
        args.new_ip4.as_deref().unwrap_or_default(),
    )?;
    let time_shift = parse_duration(args.time.as_deref().unwrap_or_default())?;

    let config = Config {
        input_file: args.input_file,
        output_file: args.output_file,
        mac,
        ipv4,
        target_date: TargetDate {
            year: args.year,
            month: args.month,
            day: args.day,
        },
        time_shift,
        progress_interval: Duration::from_secs(args.progress_interval),
    };

    let counters = rewrite_file(config)?;

    println!("Number of packets processed: {}", counters.total);
    println!("Number of ARP packets: {}", counters.arp);
    println!("Number of 802.1Q packets: {}", counters.dot1q);
    println!("Number of QinQ packets: {}", counters.qinq);
    if counters.malformed > 0 {
        println!("Number of malformed packets: {}", counters.malformed);
    }
    Ok(())
}
