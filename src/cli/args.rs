//! Command-line argument parsing for the scanstream CLI.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use crate::config::{SessionConfig, StreamRequest};
use crate::report::ReportMode;

pub const USAGE: &str = "\
Usage: scanstream <url> [options]

Options:
  --post <json>         Send a POST with this JSON body instead of a GET
  --header <k: v>       Extra request header (repeatable)
  --mode <mode>         Report markers to watch: whitebox | blackbox
  --max-retries <n>     Consecutive failures before giving up
  -V, --version         Print version
  -h, --help            Print this help";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Tail a scan stream (default)
    Tail(TailArgs),
}

/// Options for tailing one stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TailArgs {
    pub url: String,
    pub post_body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub mode: Option<ReportMode>,
    pub max_retries: Option<u32>,
}

impl TailArgs {
    pub fn request(&self) -> StreamRequest {
        let request = match &self.post_body {
            Some(body) => StreamRequest::post(&self.url, body.clone()),
            None => StreamRequest::get(&self.url),
        };
        self.headers
            .iter()
            .fold(request, |req, (k, v)| req.with_header(k, v))
    }

    /// Layer flag overrides on top of `base`.
    pub fn apply(&self, base: SessionConfig) -> SessionConfig {
        let mut config = base;
        if let Some(mode) = self.mode {
            config = config.with_report_mode(mode);
        }
        if let Some(n) = self.max_retries {
            config = config.with_max_retries(n);
        }
        config
    }
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use scanstream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["scanstream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, String>
where
    I: Iterator<Item = String>,
{
    let mut tail = TailArgs::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--post" => {
                let raw = value_for(&mut args, "--post")?;
                let body = serde_json::from_str(&raw)
                    .map_err(|e| format!("--post expects JSON: {}", e))?;
                tail.post_body = Some(body);
            }
            "--header" | "-H" => {
                let raw = value_for(&mut args, "--header")?;
                let (name, value) = raw
                    .split_once(':')
                    .ok_or_else(|| format!("--header expects 'Name: value', got '{}'", raw))?;
                tail.headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
            "--mode" => {
                tail.mode = Some(value_for(&mut args, "--mode")?.parse()?);
            }
            "--max-retries" => {
                let raw = value_for(&mut args, "--max-retries")?;
                let n = raw
                    .parse()
                    .map_err(|_| format!("--max-retries expects a number, got '{}'", raw))?;
                tail.max_retries = Some(n);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option: {}", flag)),
            url => {
                if !tail.url.is_empty() {
                    return Err(format!("unexpected argument: {}", url));
                }
                tail.url = url.to_string();
            }
        }
    }

    if tail.url.is_empty() {
        return Err("missing stream URL".to_string());
    }
    Ok(CliCommand::Tail(tail))
}

fn value_for<I>(args: &mut I, flag: &str) -> Result<String, String>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or_else(|| format!("{} requires a value", flag))
}
