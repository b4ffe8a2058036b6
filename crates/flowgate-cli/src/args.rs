//! Command-line argument parsing

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use flowgate_core::{Direction, Protocol};

/// flowgate - classify a network flow against a firewall rule document
///
/// Loads a TOML rule document and an optional malicious-domain blocklist,
/// then classifies the flow described by the command-line flags. The exit
/// code reflects the verdict: 0 for allow, 1 for block.
#[derive(Parser, Debug)]
#[command(name = "flowgate")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Rule document path (TOML)
    #[arg(short = 'r', long, value_name = "FILE")]
    pub rules: PathBuf,

    /// Malicious-domain blocklist path (one domain per line, # comments)
    #[arg(short = 'b', long, value_name = "FILE")]
    pub blocklist: Option<PathBuf>,

    /// Target false-positive rate for the domain filter
    #[arg(long, value_name = "RATE", default_value_t = 0.001)]
    pub filter_fp_rate: f64,

    /// Expected domain count for filter sizing (default: blocklist length)
    #[arg(long, value_name = "COUNT")]
    pub filter_capacity: Option<usize>,

    /// Flow direction
    #[arg(short = 'd', long, value_enum, default_value = "out")]
    pub direction: DirectionArg,

    /// Flow protocol
    #[arg(short = 'p', long, value_enum, default_value = "tcp")]
    pub protocol: ProtocolArg,

    /// Destination host name, as resolved or observed
    #[arg(long, value_name = "HOST")]
    pub dst_host: Option<String>,

    /// Destination IP address
    #[arg(long, value_name = "IP")]
    pub dst_ip: Option<IpAddr>,

    /// Destination port
    #[arg(long, value_name = "PORT")]
    pub dst_port: u16,

    /// Source IP address
    #[arg(long, value_name = "IP")]
    pub src_ip: Option<IpAddr>,

    /// Source port (0 = unknown)
    #[arg(long, value_name = "PORT", default_value_t = 0)]
    pub src_port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Flow direction flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    /// Traffic arriving at this host
    In,
    /// Traffic leaving this host
    Out,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::In => Direction::Inbound,
            DirectionArg::Out => Direction::Outbound,
        }
    }
}

/// Flow protocol flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Tcp => Protocol::Tcp,
            ProtocolArg::Udp => Protocol::Udp,
            ProtocolArg::Icmp => Protocol::Icmp,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON lines
    Json,
}
