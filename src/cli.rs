use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::ping::PingConfig;
use crate::trace::TraceConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Mode {
    Ping(PingArgs),
    Trace(TraceArgs),
}

#[derive(Debug, Clone)]
pub struct PingArgs {
    pub target: String,
    pub resolve_addresses: bool,
    pub count: u32,
    pub size: u32,
    pub ttl: Option<u32>,
    pub timeout: u32,
    pub random_identifier: bool,
}

impl Default for PingArgs {
    fn default() -> Self {
        Self {
            target: String::new(),
            resolve_addresses: false,
            count: 4,
            size: 32,
            ttl: None,
            timeout: 1000,
            random_identifier: false,
        }
    }
}

impl PingArgs {
    pub fn to_config(&self, identifier: u16) -> PingConfig {
        PingConfig {
            identifier,
            count: self.count,
            payload_size: self.size as usize,
            timeout: Duration::from_millis(self.timeout as u64),
            ttl: self.ttl.map(|ttl| ttl as u8),
            ..PingConfig::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceArgs {
    pub target: String,
    pub resolve_addresses: bool,
    pub max_hops: u32,
    pub attempts: u32,
    pub timeout: u32,
}

impl Default for TraceArgs {
    fn default() -> Self {
        Self {
            target: String::new(),
            resolve_addresses: false,
            max_hops: 30,
            attempts: 3,
            timeout: 3000,
        }
    }
}

impl TraceArgs {
    pub fn to_config(&self) -> TraceConfig {
        TraceConfig {
            max_hops: self.max_hops as u8,
            attempts_per_hop: self.attempts,
            timeout: Duration::from_millis(self.timeout as u64),
        }
    }
}

fn target_arg() -> Arg {
    Arg::new("target")
        .help("Target hostname or IPv4 address")
        .required(true)
        .index(1)
}

fn resolve_arg() -> Arg {
    Arg::new("resolve")
        .short('a')
        .help("Resolve addresses to hostnames")
        .action(ArgAction::SetTrue)
}

fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .short('w')
        .help("Timeout in milliseconds to wait for each reply")
        .value_name("timeout")
        .value_parser(clap::value_parser!(u32))
}

pub fn build_cli() -> Command {
    Command::new("pingtrace")
        .version("0.1.0")
        .about("ICMP ping and traceroute for IPv4")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("ping")
                .about("Send ICMP Echo Requests and report round-trip times")
                .arg(target_arg())
                .arg(resolve_arg())
                .arg(timeout_arg())
                .arg(
                    Arg::new("count")
                        .short('n')
                        .help("Number of echo requests to send")
                        .value_name("count")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("size")
                        .short('l')
                        .help("Send buffer size")
                        .value_name("size")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("ttl")
                        .short('i')
                        .help("Time To Live")
                        .value_name("TTL")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("random_id")
                        .long("random-id")
                        .help("Use a random echo identifier instead of 1")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("traceroute")
                .visible_alias("tracert")
                .about("Discover the routers on the path to a host")
                .arg(target_arg())
                .arg(resolve_arg())
                .arg(timeout_arg())
                .arg(
                    Arg::new("max_hops")
                        .short('m')
                        .help("Maximum number of hops to search for target")
                        .value_name("max_hops")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("attempts")
                        .short('q')
                        .help("Number of probes per hop")
                        .value_name("attempts")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
}

fn target_of(matches: &ArgMatches) -> anyhow::Result<String> {
    matches
        .get_one::<String>("target")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing target"))
}

fn ping_args(matches: &ArgMatches) -> anyhow::Result<PingArgs> {
    let mut args = PingArgs {
        target: target_of(matches)?,
        resolve_addresses: matches.get_flag("resolve"),
        random_identifier: matches.get_flag("random_id"),
        ..PingArgs::default()
    };

    if let Some(count) = matches.get_one::<u32>("count") {
        args.count = *count;
    }

    if let Some(size) = matches.get_one::<u32>("size") {
        args.size = *size;
    }

    if let Some(ttl) = matches.get_one::<u32>("ttl") {
        args.ttl = Some(*ttl);
    }

    if let Some(timeout) = matches.get_one::<u32>("timeout") {
        args.timeout = *timeout;
    }

    Ok(args)
}

fn trace_args(matches: &ArgMatches) -> anyhow::Result<TraceArgs> {
    let mut args = TraceArgs {
        target: target_of(matches)?,
        resolve_addresses: matches.get_flag("resolve"),
        ..TraceArgs::default()
    };

    if let Some(max_hops) = matches.get_one::<u32>("max_hops") {
        args.max_hops = *max_hops;
    }

    if let Some(attempts) = matches.get_one::<u32>("attempts") {
        args.attempts = *attempts;
    }

    if let Some(timeout) = matches.get_one::<u32>("timeout") {
        args.timeout = *timeout;
    }

    Ok(args)
}

pub fn parse_from<I, T>(argv: I) -> anyhow::Result<Mode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli().try_get_matches_from(argv)?;

    match matches.subcommand() {
        Some(("ping", sub)) => Ok(Mode::Ping(ping_args(sub)?)),
        Some(("traceroute", sub)) => Ok(Mode::Trace(trace_args(sub)?)),
        _ => Err(anyhow::anyhow!("expected a subcommand: ping or traceroute")),
    }
}

pub fn parse_args() -> anyhow::Result<Mode> {
    parse_from(std::env::args_os())
}
