use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static THROUGHPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Aggregated throughput: ([0-9\.]+) MB/sec").expect("valid throughput regex")
});

/// Why a trial produced no sample
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrialError {
    #[error("Benchmark exited with {code}\nstderr: {stderr}\nstdout: {stdout}")]
    ProcessFailure {
        code: String,
        stdout: String,
        stderr: String,
    },
    #[error("Benchmark did not output data in the expected format\nstdout: {stdout}")]
    OutputFormat { stdout: String },
    #[error("Throughput '{value}' is not a number")]
    ValueParse { value: String },
}

/// Extracts the aggregated throughput in MB/sec from benchmark stdout
pub fn parse_throughput(stdout: &str) -> Result<f64, TrialError> {
    let value = THROUGHPUT_RE
        .captures(stdout)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| TrialError::OutputFormat {
            stdout: stdout.trim().to_owned(),
        })?
        .as_str();
    value.parse::<f64>().map_err(|_| TrialError::ValueParse {
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_throughput_line() {
        let out = "setup done\nAggregated throughput: 150.5 MB/sec\nteardown\n";
        assert_eq!(parse_throughput(out), Ok(150.5));
        assert_eq!(
            parse_throughput("Aggregated throughput: 42 MB/sec"),
            Ok(42.0)
        );
    }

    #[test]
    fn missing_line_is_format_error() {
        assert_eq!(
            parse_throughput("  Throughput: 150.5 MB/sec\n"),
            Err(TrialError::OutputFormat {
                stdout: "Throughput: 150.5 MB/sec".to_owned()
            })
        );
        assert!(matches!(
            parse_throughput("Aggregated throughput: fast MB/sec"),
            Err(TrialError::OutputFormat { .. })
        ));
    }

    #[test]
    fn malformed_number_is_parse_error() {
        assert_eq!(
            parse_throughput("Aggregated throughput: 1.2.3 MB/sec"),
            Err(TrialError::ValueParse {
                value: "1.2.3".to_owned()
            })
        );
    }
}
