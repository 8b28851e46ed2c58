//! Runs an echo session against one destination.

use crate::interrupt::watch_interrupt;
use crate::report::{ping_header, ping_statistics, reply_line};
use crate::resolve::Resolver;
use probe_core::execution::echo_session;
use probe_core::{
    CancellationToken, EchoConfig, EchoReport, ProbeDriver, ProbeError, ProbeResult,
    ResultDestination,
};
use probe_icmp::IcmpDriver;
use probe_packets::RawIcmpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

/// Runs ping with the given configuration.
///
/// Reply lines are printed as they arrive unless `json` is set. The
/// returned report is complete even when the session was interrupted.
pub async fn run_ping(config: EchoConfig, json: bool) -> Result<EchoReport, ProbeError> {
    config.validate()?;

    let mut resolver = Resolver::from_system_conf();
    let target = resolver.lookup_ipv4(&config.hostname).await?;

    info!(
        "Starting ping to {} ({}) with {} byte payload",
        config.hostname, target, config.payload_size
    );
    if !json {
        println!("{}", ping_header(&config.hostname, target, config.payload_size));
    }

    let socket = RawIcmpSocket::open()?;
    let mut driver = IcmpDriver::new(target, config.payload_size, Box::new(socket));

    let interrupt = CancellationToken::new();
    let watcher = watch_interrupt(interrupt.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    let (outcome, ()) = tokio::join!(
        echo_session(&mut driver, &config.params, &interrupt, tx),
        print_replies(rx, &mut resolver, json),
    );

    watcher.abort();
    let closed = driver.close().await;
    let outcome = outcome?;
    closed?;

    debug!(stop = ?outcome.stop, sent = outcome.sent, "Echo session finished");

    let report = EchoReport::new(
        ResultDestination {
            hostname: config.hostname.clone(),
            ip_address: target,
        },
        config.payload_size,
        &outcome,
    );

    if !json {
        println!();
        for line in ping_statistics(&config.hostname, &report.statistics, outcome.elapsed) {
            println!("{}", line);
        }
    }

    Ok(report)
}

async fn print_replies(
    mut rx: UnboundedReceiver<ProbeResult>,
    resolver: &mut Resolver,
    json: bool,
) {
    while let Some(result) = rx.recv().await {
        if json {
            continue;
        }
        let (Some(reply), Some(rtt)) = (result.reply, result.rtt) else {
            continue;
        };
        let name = resolver.reverse_name(reply.responder).await;
        println!("{}", reply_line(&reply, &name, rtt));
    }
}
