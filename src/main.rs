mod cli;
mod dns;
mod icmp;
mod ping;
mod stats;
mod trace;
mod utils;

use cli::{Mode, PingArgs, TraceArgs};
use icmp::IcmpSocket;
use ping::EchoSession;
use stats::PingStatistics;
use trace::HopDiscovery;

#[tokio::main]
async fn main() {
    // Enable debug logging if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
    }

    let mode = match cli::parse_args() {
        Ok(mode) => mode,
        Err(e) => match e.downcast_ref::<clap::Error>() {
            Some(clap_error) => clap_error.exit(),
            None => utils::exit_with_error(&e.to_string(), 1),
        },
    };

    let result = match mode {
        Mode::Ping(args) => run_ping(args).await,
        Mode::Trace(args) => run_trace(args).await,
    };

    if let Err(e) = result {
        utils::exit_with_error(&e.to_string(), 1);
    }
}

async fn run_ping(args: PingArgs) -> anyhow::Result<()> {
    utils::validate_ping_params(args.size, args.count, args.timeout, args.ttl)?;

    let target_ip = dns::resolve_ipv4(&args.target).await.map_err(|e| {
        log::debug!("resolution failed: {}", e);
        anyhow::anyhow!(
            "Ping request could not find host {}. Please check the name and try again.",
            args.target
        )
    })?;

    let socket = IcmpSocket::new()?;
    socket.connect(target_ip).map_err(|e| {
        log::debug!("{}", e);
        anyhow::anyhow!("Ping could not connect to {}.", args.target)
    })?;

    let identifier = if args.random_identifier {
        utils::generate_identifier()
    } else {
        1
    };
    let config = args.to_config(identifier);

    println!("{}", stats::format_ping_header(&args.target, target_ip, config.payload_size));

    let statistics = tokio::task::spawn_blocking(move || -> anyhow::Result<PingStatistics> {
        let mut statistics = PingStatistics::new();
        let mut session = EchoSession::new(socket, target_ip, config)?;

        session.run(|report| {
            statistics.record(&report.outcome);
            let name = match args.resolve_addresses {
                true => dns::reverse_lookup(report.source),
                false => None,
            };
            println!("{}", stats::format_reply(report, name.as_deref()));
        });

        Ok(statistics)
    })
    .await??;

    println!("{}", statistics.format_summary(target_ip));
    Ok(())
}

async fn run_trace(args: TraceArgs) -> anyhow::Result<()> {
    utils::validate_trace_params(args.max_hops, args.attempts, args.timeout)?;

    let target_ip = dns::resolve_ipv4(&args.target).await.map_err(|e| {
        log::debug!("resolution failed: {}", e);
        anyhow::anyhow!("Unable to resolve target system name {}.", args.target)
    })?;

    let socket = IcmpSocket::new()?;
    let config = args.to_config();

    println!("{}", stats::format_trace_header(&args.target, target_ip, config.max_hops));

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<trace::SweepResult> {
        let mut discovery = HopDiscovery::new(socket, target_ip, config)?;

        let result = discovery.run(|hop| {
            let name = match (args.resolve_addresses, hop.responder) {
                (true, Some(address)) => dns::reverse_lookup(address),
                _ => None,
            };
            println!("{}", stats::format_hop(hop, name.as_deref()));
        })?;

        Ok(result)
    })
    .await??;

    log::debug!("sweep finished after {} hops", result.hops);
    if result.reached {
        println!("\nTrace complete.");
    }
    Ok(())
}
