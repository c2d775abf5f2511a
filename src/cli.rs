use clap::{Parser, ValueEnum};

use crate::format::RecordType;

/// Command-line interface definition.
///
/// Verbosity levels:
/// 0 - errors only
/// 1 - warnings + errors (default)
/// 2 - info
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Extract FTP, server, mailbox, website and domain migration credentials from a support message"
)]
pub struct Cli {
    /// Message file to analyze; reads stdin when absent or "-"
    #[arg(value_name = "FILE")]
    pub input: Option<String>,

    /// Client name attached to every record
    #[arg(long, value_name = "NAME")]
    pub client_name: Option<String>,

    /// Client identifier attached to every record
    #[arg(long, value_name = "ID")]
    pub client_id: Option<String>,

    /// Ticket identifier attached to every record
    #[arg(long = "ticket", value_name = "TICKET")]
    pub ticket_id: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// JSON layout used with --output-dir
    #[arg(long, value_enum, default_value_t = Layout::Flat)]
    pub layout: Layout,

    /// Restrict CSV output to one category (ftp, website, domain, email, generic)
    #[arg(long, value_name = "TYPE")]
    pub category: Option<RecordType>,

    /// Write export artifacts into this directory instead of stdout
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Remote inference endpoint; enables the remote pass
    #[arg(long, value_name = "URL", conflicts_with = "no_remote")]
    pub remote_url: Option<String>,

    /// Remote inference timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub remote_timeout: Option<u64>,

    /// Never contact the remote inference service
    #[arg(long, default_value_t = false)]
    pub no_remote: bool,

    /// Advisory confidence threshold, reported but never used to drop records
    #[arg(long, value_name = "F", default_value_t = 0.0)]
    pub confidence_threshold: f64,

    /// Attach the surrounding source text to every record
    #[arg(long)]
    pub include_context: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Print the JSON schema of the structured report and exit
    #[arg(long)]
    pub generate_schema: bool,

    /// Verbosity level (0,1,2,5)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled terminal summary
    Text,
    /// Structured report as JSON
    Json,
    /// Structured report as YAML
    Yaml,
    /// CSV per category
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    Flat,
    Grouped,
    Categorized,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Input path, `None` for stdin.
    pub fn input_path(&self) -> Option<&str> {
        self.input.as_deref().filter(|p| *p != "-")
    }

    /// `tracing` filter directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "warn",
            2..=4 => "info",
            _ => "trace",
        }
    }

    pub fn is_trace(&self) -> bool {
        self.verbose >= 5
    }
}
