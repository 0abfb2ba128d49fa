use clap::{Parser, ValueEnum};

const CMD_NAME: &str = "methylseq";
const DEFAULT_OUTPUT: &str = ".";

/// Raw command-line arguments as clap parses them.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Configuration file; may repeat, later files override earlier ones
    #[arg(short, long, value_name = "FILE", required = true)]
    #[arg(env = "SEQPIPE_CONFIG")]
    pub config: Vec<String>,

    /// Readset sheet
    #[arg(short, long, value_name = "FILE")]
    pub readsets: String,

    /// Design sheet (needed by the differential methylation steps)
    #[arg(short, long, value_name = "FILE")]
    pub design: Option<String>,

    /// Step range, e.g. '1-5,7'
    #[arg(short, long, value_name = "RANGE")]
    pub steps: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    #[arg(env = "SEQPIPE_OUTPUT")]
    pub output_dir: String,

    /// Scheduler the generated script submits to
    #[arg(short = 'j', long, value_name = "TYPE", default_value = "pbs")]
    pub job_scheduler: SchedulerKind,

    /// Ignore timestamps and regenerate every job in range
    #[arg(short, long)]
    pub force: bool,

    /// Print removal commands for intermediate files instead of a script
    #[arg(long, conflicts_with = "report")]
    pub clean: bool,

    /// Print the report merge command instead of a script
    #[arg(long)]
    pub report: bool,

    /// Stderr log level
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    pub loglevel: LogLevel,
}

/// Which formatter renders the submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulerKind {
    /// qsub submissions with dependency flags between jobs
    Pbs,
    /// plain shell commands run in script order
    Batch,
}

/// Stderr verbosity names accepted by -l.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The `log` filter this CLI level selects.
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}
