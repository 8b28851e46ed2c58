//! Prints the route packets take to a network host.

use clap::Parser;
use probe_cli::exit::{exit_status, failure_message};
use probe_cli::logging::init_logging;
use probe_cli::traceroute::run_traceroute;
use probe_core::{ProbeError, SweepConfig, SweepParams, MAX_PROBES_PER_HOP};
use std::process::ExitCode;

const USAGE: &str = "traceroute [-q nqueries] [-n] [-S] destination";

/// Print the route packets trace to a network host.
#[derive(Parser, Debug)]
#[command(name = "traceroute")]
#[command(version)]
#[command(override_usage = USAGE)]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// Target hostname or IPv4 address.
    #[arg(required = true)]
    pub destination: String,

    /// Probes sent per hop.
    #[arg(short = 'q', default_value = "3")]
    pub nqueries: i64,

    /// Print hop addresses numerically.
    #[arg(short = 'n')]
    pub numeric: bool,

    /// Print the percentage of lost probes for each hop.
    #[arg(short = 'S')]
    pub loss_summary: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Convert CLI args to SweepConfig.
    fn to_config(&self) -> Result<SweepConfig, ProbeError> {
        let probes_per_hop = u8::try_from(self.nqueries)
            .ok()
            .filter(|&q| (1..=MAX_PROBES_PER_HOP).contains(&q))
            .ok_or(ProbeError::InvalidProbesPerHop(self.nqueries))?;

        let config = SweepConfig {
            hostname: self.destination.clone(),
            numeric: self.numeric,
            loss_summary: self.loss_summary,
            params: SweepParams {
                probes_per_hop,
                ..SweepParams::default()
            },
            ..SweepConfig::default()
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

    match run_traceroute(config, args.json).await {
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
                    eprintln!("traceroute: failed to serialize results: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &ProbeError) -> ExitCode {
    eprintln!("{}", failure_message("traceroute", USAGE, err));
    ExitCode::from(exit_status(err))
}
