use byte_unit::Byte;
use clap::Parser;
use std::{net::IpAddr, ops::RangeInclusive};

const DEFAULT_PORT: u16 = 11211;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const CONNECTION_LIMIT: u32 = 1024;
const MEMORY_LIMIT: &str = "1GiB";
const ITEM_SIZE_LIMIT: &str = "0";
const TIMEOUT_SECS: u32 = 5;

fn get_default_threads_number() -> usize {
    num_cpus::get_physical()
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// memcached text protocol compatible server implementation in Rust
pub struct MemtextdConfig {
    #[arg(short, long, value_name = "PORT", value_parser = port_in_range, default_value_t = DEFAULT_PORT)]
    /// TCP port to listen on
    pub port: u16,

    #[arg(short, long, value_name = "CONNECTION-LIMIT", default_value_t = CONNECTION_LIMIT)]
    /// max simultaneous connections
    pub connection_limit: u32,

    #[arg(short, long, value_name = "MEMORY-LIMIT", value_parser = parse_memory_bytes, default_value = MEMORY_LIMIT)]
    /// total cache capacity (keys, values and per-entry overhead)
    pub memory_limit: u64,

    #[arg(short, long, value_name = "ITEM-SIZE-LIMIT", value_parser = parse_memory_bytes, default_value = ITEM_SIZE_LIMIT)]
    /// max size of a single value, 0 means unlimited
    pub item_size_limit: u64,

    #[arg(short, long, value_name = "TIMEOUT-SECS", default_value_t = TIMEOUT_SECS)]
    /// per session idle timeout in seconds
    pub timeout_secs: u32,

    #[arg(long, value_name = "THREADS", default_value_t = get_default_threads_number())]
    /// number of worker threads to use (defaults to number of physical cores)
    pub threads: usize,

    #[arg(short, long, action = clap::ArgAction::Count, default_value_t = 1)]
    /// sets the level of verbosity
    pub verbose: u8,

    #[arg(short, long, value_name = "LISTEN", default_value_t = String::from(DEFAULT_ADDRESS).parse::<IpAddr>().unwrap())]
    /// interface to listen on
    pub listen_address: IpAddr,
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

fn parse_memory_bytes(s: &str) -> Result<u64, String> {
    match Byte::parse_str(s, true) {
        Ok(bytes) => Ok(bytes.as_u64()),
        Err(byte_error) => Err(format!("{}", byte_error)),
    }
}

impl MemtextdConfig {
    fn from_args(args: Vec<String>) -> Result<MemtextdConfig, String> {
        MemtextdConfig::try_parse_from(args.iter()).map_err(|err| err.to_string())
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

pub fn parse(args: Vec<String>) -> Result<MemtextdConfig, String> {
    MemtextdConfig::from_args(args)
}
