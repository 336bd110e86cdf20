//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use simplelog::LevelFilter;

#[derive(Parser)]
#[command(
    name = "datagrid",
    version,
    about = "Browse a paginated list endpoint as an interactive table",
    long_about = "Browse a paginated JSON list endpoint as a table.\n\n\
                  Type commands such as `search alice`, `sort name` or `next` \
                  on stdin; `help` lists them all."
)]
pub struct Cli {
    /// List endpoint, e.g. https://api.example.com/users.
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// Page URL holding shareable query state.
    #[arg(long, value_name = "URL", default_value = "http://localhost/users")]
    pub location: String,

    /// JSON file with table configuration overrides.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Identifier under which column widths are stored.
    #[arg(long = "table-id", value_name = "ID")]
    pub table_id: Option<String>,

    /// Keep settings in memory instead of the settings database.
    #[arg(long = "in-memory")]
    pub in_memory: bool,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Log level written to the log file.
    #[arg(long = "log-level", value_enum, default_value = "info")]
    pub log_level: LogLevelArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}
