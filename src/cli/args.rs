//! Command-line argument parsing for IG Fetcher
//!
//! This module defines the CLI structure using clap derive macros: report
//! acquisition, authentication management and configuration files.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use humantime_serde::re::humantime;

use crate::app::{
    AcquireOptions, CacheControl, CourseParTable, ParseMetadata, ReportKind, ReportRequest,
};

/// IG Fetcher - read club reports from an API-less management site
#[derive(Parser, Debug)]
#[command(
    name = "ig_fetcher",
    version,
    about = "Fetch and parse reports from a club management web site",
    long_about = "Logs in with the member and admin step-up login, keeps the session fresh,
fetches report pages and parses their tables into JSON records. Results are cached
in memory for the lifetime of the process."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a report and print its records as JSON
    Report(ReportArgs),

    /// Manage authentication credentials
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the report command
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Report layout: leaderboard, results or members
    pub kind: ReportKind,

    /// Report URL, absolute or relative to the site base URL
    pub url: String,

    /// Form field posted with the request (repeatable, implies POST)
    #[arg(long = "form", value_name = "KEY=VALUE", value_parser = parse_form_field)]
    pub form: Vec<(String, String)>,

    /// Skip cache reads (results are still cached)
    #[arg(long)]
    pub no_cache: bool,

    /// Cache key (derived from the report and URL when omitted)
    #[arg(long, value_name = "KEY")]
    pub cache_key: Option<String>,

    /// Parsed-result TTL, e.g. "10m"
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub ttl: Option<Duration>,

    /// Course par for a tee (repeatable), e.g. "gents.white=72"
    #[arg(long = "par", value_name = "TEE=PAR", value_parser = parse_course_par)]
    pub pars: Vec<(String, i32)>,

    /// Tee assumed for rows that do not name one
    #[arg(long, value_name = "TEE")]
    pub tee: Option<String>,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Set up member id, PIN and admin password
    Setup,

    /// Log in once and report the session state
    Verify,

    /// Show authentication status
    Status {
        /// Also test the login against the site
        #[arg(long)]
        check: bool,
    },
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl ReportArgs {
    /// The request to issue
    pub fn request(&self) -> ReportRequest {
        if self.form.is_empty() {
            ReportRequest::get(self.url.trim())
        } else {
            ReportRequest::post(self.url.trim(), self.form.clone())
        }
    }

    /// Cache key: explicit, else derived from the report kind and request
    pub fn cache_key(&self) -> String {
        match &self.cache_key {
            Some(key) => key.clone(),
            None => self.kind.cache_key(&self.url, &self.form),
        }
    }

    /// Parse metadata built from `--par` and `--tee`
    pub fn metadata(&self) -> Option<ParseMetadata> {
        if self.pars.is_empty() && self.tee.is_none() {
            return None;
        }
        let pars: CourseParTable = self.pars.iter().cloned().collect();
        let mut metadata = ParseMetadata::with_course_pars(pars);
        if let Some(tee) = &self.tee {
            metadata = metadata.with_default_tee(tee.clone());
        }
        Some(metadata)
    }

    /// Acquisition options for this invocation
    pub fn options(&self) -> AcquireOptions {
        let mut options = AcquireOptions::cached(self.cache_key());
        if let Some(ttl) = self.ttl {
            options = options.with_ttl(ttl);
        }
        if self.no_cache {
            options = options.with_cache_control(CacheControl::Bypass);
        }
        if let Some(metadata) = self.metadata() {
            options = options.with_metadata(metadata);
        }
        options
    }
}

fn split_pair(value: &str) -> Result<(&str, &str), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", value));
    }
    Ok((key, val.trim()))
}

/// Parse a `KEY=VALUE` form field
pub fn parse_form_field(value: &str) -> Result<(String, String), String> {
    let (key, val) = split_pair(value)?;
    Ok((key.to_string(), val.to_string()))
}

/// Parse a `TEE=PAR` course par
pub fn parse_course_par(value: &str) -> Result<(String, i32), String> {
    let (tee, par) = split_pair(value)?;
    let par = par
        .parse::<i32>()
        .map_err(|_| format!("par must be a whole number, got '{}'", par))?;
    Ok((tee.to_string(), par))
}
