//! Failure reporting shared by both binaries.

use probe_core::ProbeError;

/// Exit status for bad options, matching clap's usage errors.
pub const USAGE_EXIT_STATUS: u8 = 2;

/// Exit status for every other failure.
pub const FAILURE_EXIT_STATUS: u8 = 1;

/// Text written to stderr when `tool` fails with `err`.
///
/// Option errors are followed by the usage line.
pub fn failure_message(tool: &str, usage: &str, err: &ProbeError) -> String {
    if err.is_configuration() {
        format!("{}: {}\nUsage: {}", tool, err, usage)
    } else {
        format!("{}: {}", tool, err)
    }
}

pub fn exit_status(err: &ProbeError) -> u8 {
    if err.is_configuration() {
        USAGE_EXIT_STATUS
    } else {
        FAILURE_EXIT_STATUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USAGE: &str = "traceroute [-q nqueries] [-n] [-S] destination";

    #[test]
    fn test_option_error_repeats_usage() {
        let err = ProbeError::InvalidProbesPerHop(11);
        assert_eq!(
            failure_message("traceroute", USAGE, &err),
            "traceroute: bad number of probes per hop 11: no more than 10 probes per hop\n\
             Usage: traceroute [-q nqueries] [-n] [-S] destination"
        );
        assert_eq!(exit_status(&err), USAGE_EXIT_STATUS);
    }

    #[test]
    fn test_runtime_error_is_plain() {
        let err = ProbeError::HostNotFound {
            hostname: "nowhere.invalid".to_string(),
            reason: "NXDOMAIN".to_string(),
        };
        assert_eq!(
            failure_message("ping", USAGE, &err),
            "ping: unknown host nowhere.invalid"
        );
        assert_eq!(exit_status(&err), FAILURE_EXIT_STATUS);
    }
}
