//! Sends ICMP echo requests and reports round-trip times.

use clap::Parser;
use probe_cli::exit::{exit_status, failure_message};
use probe_cli::logging::init_logging;
use probe_cli::ping::run_ping;
use probe_core::{EchoConfig, EchoParams, ProbeError, MAX_PAYLOAD_SIZE};
use std::process::ExitCode;
use std::time::Duration;

const USAGE: &str = "ping [-c count] [-i wait] [-s packetsize] [-t timeout] destination";

/// Send ICMP ECHO_REQUEST packets to network hosts.
#[derive(Parser, Debug)]
#[command(name = "ping")]
#[command(version)]
#[command(override_usage = USAGE)]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// Target hostname or IPv4 address.
    #[arg(required = true)]
    pub destination: String,

    /// Stop after sending this many requests.
    #[arg(short = 'c')]
    pub count: Option<i64>,

    /// Seconds to wait between requests.
    #[arg(short = 'i', default_value = "1")]
    pub wait: f64,

    /// Bytes of payload per request.
    #[arg(short = 's', default_value = "56")]
    pub packet_size: i64,

    /// Stop after this many seconds regardless of replies; 0 disables.
    #[arg(short = 't', default_value = "0")]
    pub timeout: f64,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Convert CLI args to EchoConfig.
    fn to_config(&self) -> Result<EchoConfig, ProbeError> {
        let count = match self.count {
            None => 0,
            Some(c) if c > 0 => u32::try_from(c).map_err(|_| ProbeError::InvalidCount(c))?,
            Some(c) => return Err(ProbeError::InvalidCount(c)),
        };

        if !(self.wait.is_finite() && self.wait > 0.0) {
            return Err(ProbeError::InvalidInterval(self.wait));
        }
        let interval = Duration::try_from_secs_f64(self.wait)
            .map_err(|_| ProbeError::InvalidInterval(self.wait))?;

        if self.packet_size < 0 {
            return Err(ProbeError::NegativePacketSize(self.packet_size));
        }
        let payload_size = usize::try_from(self.packet_size)
            .ok()
            .filter(|&size| size <= MAX_PAYLOAD_SIZE)
            .ok_or(ProbeError::PacketTooLarge {
                size: self.packet_size as usize,
                max: MAX_PAYLOAD_SIZE,
            })?;

        if !(self.timeout.is_finite() && self.timeout >= 0.0) {
            return Err(ProbeError::InvalidDeadline(self.timeout));
        }
        let deadline = Duration::try_from_secs_f64(self.timeout)
            .map_err(|_| ProbeError::InvalidDeadline(self.timeout))?;

        let config = EchoConfig {
            hostname: self.destination.clone(),
            payload_size,
            params: EchoParams {
                count,
                interval,
                deadline: (!deadline.is_zero()).then_some(deadline),
                ..EchoParams::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        println!("Usage: {}", USAGE);
        return ExitCode::SUCCESS;
    }

    let args = Args::parse();
    init_logging(args.verbose);

    let config = match args.to_config() {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    match run_ping(config, args.json).await {
        Ok(report) => {
            if !args.json {
                return ExitCode::SUCCESS;
            }
            match report.to_json() {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("ping: failed to serialize results: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &ProbeError) -> ExitCode {
    eprintln!("{}", failure_message("ping", USAGE, err));
    ExitCode::from(exit_status(err))
}
