use std::io::Write;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

use crate::config::ReportConfig;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Bounds of the counting loop, `start..end`. `end` is clamped to `start` for a non-positive sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRange {
    pub start: i64,
    pub end: i64,
}

impl CounterRange {
    pub fn up_to(sum: i64) -> Self {
        Self { start: 0, end: sum.max(0) }
    }

    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Outcome of a single [run], in the shape written by `--output-format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub num1: i32,
    pub num2: i32,
    pub sum: i64,
    pub threshold: i64,
    pub exceeds_threshold: bool,
    pub counter: CounterRange,
}

impl Report {
    pub fn write_json(&self, mut out: impl Write) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Operands are widened before adding, so the sum of any two `i32` fits.
pub fn add(a: i32, b: i32) -> i64 {
    i64::from(a) + i64::from(b)
}

pub fn print_result(out: &mut impl Write, value: i64) -> std::io::Result<()> {
    writeln!(out, "The result is: {}", value)
}

/// Writes every value of `range` followed by a space, then ends the line.
///
/// Values are written one at a time, so memory use does not depend on the length of the range.
pub fn write_counter(out: &mut impl Write, range: CounterRange) -> std::io::Result<()> {
    for i in range.start..range.end {
        write!(out, "{} ", i)?;
    }
    writeln!(out)
}

/// Computes the report for `config` without writing anything.
pub fn build(config: &ReportConfig) -> Report {
    let ReportConfig { num1, num2, threshold } = *config;

    let sum = add(num1, num2);
    let exceeds_threshold = sum > threshold;
    debug!(num1, num2, sum, threshold, exceeds_threshold, "computed sum");

    Report {
        num1,
        num2,
        sum,
        threshold,
        exceeds_threshold,
        counter: CounterRange::up_to(sum),
    }
}

/// Runs the report for `config`, writing the text output to `out`.
pub fn run(config: &ReportConfig, out: &mut impl Write) -> Result<Report, ReportError> {
    let report = build(config);

    if report.exceeds_threshold {
        print_result(out, report.sum)?;
    } else {
        writeln!(out, "Sum is less than or equal to {}", report.threshold)?;
    }

    write_counter(out, report.counter)?;

    let sum_ref = &report.sum;
    writeln!(out, "Sum via pointer: {}", *sum_ref)?;

    info!(sum = report.sum, "report finished");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    /// Accepts up to `limit` bytes, then fails every write.
    struct CappedWriter {
        written: usize,
        limit: usize,
    }

    impl CappedWriter {
        fn new(limit: usize) -> Self {
            Self { written: 0, limit }
        }
    }

    impl Write for CappedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(std::io::Error::other("write limit reached"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn run_to_string(config: &ReportConfig) -> (Report, String) {
        let mut buf = Vec::new();
        let report = run(config, &mut buf).unwrap();
        (report, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_add() {
        assert_eq!(add(5, 10), 15);
        assert_eq!(add(-3, 3), 0);
        assert_eq!(add(i32::MAX, i32::MAX), 2 * i64::from(i32::MAX));
        assert_eq!(add(i32::MIN, -1), i64::from(i32::MIN) - 1);
    }

    #[test]
    fn test_print_result() {
        let mut buf = Vec::new();
        print_result(&mut buf, 15).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "The result is: 15\n");
    }

    #[test]
    fn test_default_run() {
        let (report, output) = run_to_string(&ReportConfig::default());
        assert_eq!(
            output,
            "The result is: 15\n0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 \nSum via pointer: 15\n"
        );
        assert_eq!(report.sum, 15);
        assert!(report.exceeds_threshold);
        assert_eq!(report.counter, CounterRange { start: 0, end: 15 });
        assert_eq!(report.counter.len(), 15);
    }

    #[test]
    fn test_sum_at_threshold_is_not_greater() {
        let config = ReportConfig {
            num1: 4,
            num2: 6,
            ..Default::default()
        };
        let (report, output) = run_to_string(&config);
        assert!(!report.exceeds_threshold);
        assert!(output.starts_with("Sum is less than or equal to 10\n"));
        assert!(output.ends_with("Sum via pointer: 10\n"));
    }

    #[test]
    fn test_custom_threshold_in_message() {
        let config = ReportConfig {
            num1: 2,
            num2: 3,
            threshold: 7,
        };
        let (_, output) = run_to_string(&config);
        assert_eq!(output, "Sum is less than or equal to 7\n0 1 2 3 4 \nSum via pointer: 5\n");
    }

    #[test]
    fn test_negative_sum_prints_empty_counter_line() {
        let config = ReportConfig {
            num1: -8,
            num2: 2,
            ..Default::default()
        };
        let (report, output) = run_to_string(&config);
        assert!(report.counter.is_empty());
        assert_eq!(output, "Sum is less than or equal to 10\n\nSum via pointer: -6\n");
    }

    #[test]
    fn test_large_operands_stream_the_counter() {
        let config = ReportConfig {
            num1: i32::MAX,
            num2: i32::MAX,
            ..Default::default()
        };

        // The full counter line is tens of GB; the writer gives up after 1 MiB.
        let mut out = CappedWriter::new(1024 * 1024);
        let err = run(&config, &mut out).unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
        assert!(out.written <= out.limit);
        assert!(out.written > 1024);
    }

    #[test]
    fn test_build_large_operands() {
        let config = ReportConfig {
            num1: i32::MAX,
            num2: i32::MAX,
            ..Default::default()
        };
        let report = build(&config);
        assert_eq!(report.sum, 2 * i64::from(i32::MAX));
        assert_eq!(report.counter.len(), 2 * u64::from(i32::MAX.unsigned_abs()));
    }

    #[test]
    fn test_counter_range() {
        assert_eq!(CounterRange::up_to(3), CounterRange { start: 0, end: 3 });
        assert!(CounterRange::up_to(0).is_empty());
        assert!(CounterRange::up_to(-6).is_empty());
        assert_eq!(CounterRange::up_to(-6).len(), 0);
    }

    #[test]
    fn test_write_counter() {
        let mut buf = Vec::new();
        write_counter(&mut buf, CounterRange::up_to(3)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0 1 2 \n");
    }

    #[test]
    fn test_write_json() {
        let report = build(&ReportConfig::default());
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["sum"], 15);
        assert_eq!(value["exceeds_threshold"], true);
        assert_eq!(value["counter"], serde_json::json!({ "start": 0, "end": 15 }));

        let parsed: Report = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    #[traced_test]
    fn test_run_logs_sum() {
        run(&ReportConfig::default(), &mut std::io::sink()).unwrap();
        assert!(logs_contain("computed sum"));
        assert!(logs_contain("sum=15"));
    }
}
