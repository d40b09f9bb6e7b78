use std::io::{
    BufWriter,
    Write as _,
};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    ArgAction,
    Parser,
    ValueEnum,
};
use eyre::{
    Context,
    Result,
};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{
    NonBlocking,
    WorkerGuard,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    Registry,
};

use crate::config::{
    self,
    ConfigLayer,
};
use crate::report;
use crate::util::env_var;

/// Adds two integers, compares the sum against a threshold, and counts up to it.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(version, about)]
pub struct CliArgs {
    /// First operand
    #[arg(long, env = "SUM_REPORT_NUM1", allow_negative_numbers = true)]
    pub num1: Option<i32>,
    /// Second operand
    #[arg(long, env = "SUM_REPORT_NUM2", allow_negative_numbers = true)]
    pub num2: Option<i32>,
    /// The sum is reported as a result only when it is greater than this value
    #[arg(long, env = "SUM_REPORT_THRESHOLD", allow_negative_numbers = true)]
    pub threshold: Option<i64>,
    /// Path to a TOML file providing `num1`, `num2` and `threshold`
    #[arg(long, env = "SUM_REPORT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// The output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,
    /// Increase logging verbosity
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CliArgs {
    pub fn execute(self) -> Result<ExitCode> {
        let _guard = Self::setup_logging(self.verbose).context("failed to initialize logging")?;

        let overrides = ConfigLayer {
            num1: self.num1,
            num2: self.num2,
            threshold: self.threshold,
        };
        let config = config::resolve(self.config.as_deref(), overrides)?;

        let mut stdout = BufWriter::new(std::io::stdout().lock());
        match self.output_format {
            OutputFormat::Text => {
                report::run(&config, &mut stdout)?;
            },
            OutputFormat::Json => {
                report::build(&config).write_json(&mut stdout)?;
            },
        }
        stdout.flush()?;

        Ok(ExitCode::SUCCESS)
    }

    fn setup_logging(verbose: u8) -> Result<WorkerGuard> {
        // No logging configured, return dummy guard
        let Some(directive) = log_directive(verbose) else {
            return Ok(sink_guard());
        };

        let env_filter = EnvFilter::try_new(&directive).context("invalid log level")?;
        let max_level = env_filter.max_level_hint();
        if max_level.is_none() || max_level == Some(LevelFilter::OFF) {
            return Ok(sink_guard());
        }

        let (non_blocking, guard) = NonBlocking::new(std::io::stderr());
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false);

        Registry::default().with(env_filter).with(stderr_layer).init();

        Ok(guard)
    }
}

fn sink_guard() -> WorkerGuard {
    let (_, guard) = NonBlocking::new(std::io::sink());
    guard
}

fn log_directive(verbose: u8) -> Option<String> {
    select_log_directive(env_var::get_log_level().ok(), env_var::get_rust_log().ok(), verbose)
}

/// Picks the log filter directive: `log_level`, then `rust_log`, then the `-v` count. Blank
/// values count as unset.
fn select_log_directive(log_level: Option<String>, rust_log: Option<String>, verbose: u8) -> Option<String> {
    let non_blank = |s: &String| !s.trim().is_empty();
    log_level
        .filter(non_blank)
        .or_else(|| rust_log.filter(non_blank))
        .or_else(|| verbosity_directive(verbose).map(str::to_string))
}

fn verbosity_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}
