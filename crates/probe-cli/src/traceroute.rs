//! Runs a hop sweep towards one destination.

use crate::interrupt::watch_interrupt;
use crate::report::{hop_line, traceroute_header};
use crate::resolve::Resolver;
use probe_core::execution::hop_sweep;
use probe_core::{
    CancellationToken, Hop, ProbeDriver, ProbeError, ResultDestination, SweepConfig, SweepReport,
};
use probe_icmp::IcmpDriver;
use probe_packets::RawIcmpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

/// Runs traceroute with the given configuration.
pub async fn run_traceroute(config: SweepConfig, json: bool) -> Result<SweepReport, ProbeError> {
    config.validate()?;

    let mut resolver = Resolver::from_system_conf();
    let target = resolver.lookup_ipv4(&config.hostname).await?;

    info!(
        "Starting traceroute to {} ({}), {} probes per hop",
        config.hostname, target, config.params.probes_per_hop
    );
    if !json {
        println!(
            "{}",
            traceroute_header(
                &config.hostname,
                target,
                config.params.max_ttl,
                config.packet_size()
            )
        );
    }

    let socket = RawIcmpSocket::open()?;
    let mut driver = IcmpDriver::new(target, config.payload_size, Box::new(socket));

    let interrupt = CancellationToken::new();
    let watcher = watch_interrupt(interrupt.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let (outcome, names) = tokio::join!(
        hop_sweep(&mut driver, &config.params, target, &interrupt, tx),
        print_hops(rx, &mut resolver, &config, json),
    );

    watcher.abort();
    let closed = driver.close().await;
    let outcome = outcome?;
    closed?;

    debug!(
        hops = outcome.hops.len(),
        reached = outcome.reached,
        interrupted = outcome.interrupted,
        "Hop sweep finished"
    );

    let mut report = SweepReport::new(
        ResultDestination {
            hostname: config.hostname.clone(),
            ip_address: target,
        },
        config.params.max_ttl,
        &outcome,
    );
    for (hop, name) in report.hops.iter_mut().zip(names) {
        hop.hostname = name;
    }

    Ok(report)
}

/// Prints hops as they finish and returns the name shown for each one.
async fn print_hops(
    mut rx: UnboundedReceiver<Hop>,
    resolver: &mut Resolver,
    config: &SweepConfig,
    json: bool,
) -> Vec<Option<String>> {
    let mut names = Vec::new();
    while let Some(hop) = rx.recv().await {
        let name = match hop.responder() {
            Some(ip) if !config.numeric => Some(resolver.reverse_name(ip).await),
            _ => None,
        };
        if !json {
            println!("{}", hop_line(&hop, name.as_deref(), config.loss_summary));
        }
        names.push(name);
    }
    names
}
