//! CLI module for scanstream.
//!
//! Tails one scan stream: log entries go to stdout as they arrive, the
//! extracted report is printed at the end, and diagnostics go to stderr
//! through `tracing`.
//!
//! ```ignore
//! use scanstream::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command).await?;
//! ```

pub mod args;

pub use args::{parse_args, CliCommand, TailArgs, USAGE};

use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::info;

use crate::adapters::{FileBackupStore, ReqwestHttpClient};
use crate::config::SessionConfig;
use crate::error::StreamError;
use crate::logs::{LogEntry, LogKind};
use crate::session::{ConnectionStatus, SessionSnapshot, StreamSession};
use crate::traits::{ResponseMeta, SessionHooks};

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Execute a parsed command.
pub async fn run_cli_command(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Version => {
            println!("scanstream {}", VERSION);
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Tail(tail) => run_tail(tail).await,
    }
}

struct TailHooks {
    session_id_header: String,
}

impl SessionHooks for TailHooks {
    fn on_start(&self, response: &ResponseMeta) {
        if let Some(id) = response.header(&self.session_id_header) {
            info!(session_id = id, "Remote session started");
        }
    }
}

/// Stream until the session disconnects or Ctrl-C.
pub async fn run_tail(tail: TailArgs) -> Result<()> {
    let config = tail.apply(SessionConfig::from_env());
    let hooks = TailHooks {
        session_id_header: config.session_id_header.clone(),
    };

    let session = StreamSession::builder(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(FileBackupStore::new()?),
        tail.request(),
    )
    .hooks(Arc::new(hooks))
    .config(config)
    .build();

    let mut rx = session.subscribe();
    session.start().await;

    let mut printed = 0;
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                printed = print_new_logs(&mut stdout, &snapshot, printed)?;
                if snapshot.connection_status == ConnectionStatus::Disconnected {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.stop();
                break;
            }
        }
    }

    let snapshot = session.snapshot();
    print_new_logs(&mut stdout, &snapshot, printed)?;
    if let Some(report) = &snapshot.final_report {
        writeln!(stdout, "\n{}", report)?;
    }
    stdout.flush()?;

    if snapshot.gave_up() {
        return Err(eyre!(
            "gave up after {} attempts. {}",
            snapshot.max_retries,
            snapshot.error.as_ref().map(give_up_reason).unwrap_or_default()
        ));
    }
    Ok(())
}

fn print_new_logs(out: &mut impl Write, snapshot: &SessionSnapshot, printed: usize) -> Result<usize> {
    for entry in snapshot.logs.iter().skip(printed) {
        writeln!(out, "{}", format_entry(entry))?;
    }
    Ok(snapshot.logs.len().max(printed))
}

/// What went wrong last and what to try.
fn give_up_reason(error: &StreamError) -> String {
    format!("{} {}.", error.user_message(), error.category().recovery_hint())
}

/// One line per log entry.
pub fn format_entry(entry: &LogEntry) -> String {
    let tag = match entry.kind {
        LogKind::Text => "",
        LogKind::FunctionCall => "call ",
        LogKind::FunctionResponse => "result ",
        LogKind::Notification => "notice ",
    };
    format!("[{}] {}{}", entry.author, tag, entry.text)
}
