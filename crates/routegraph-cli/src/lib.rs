//! Line-protocol front end for the routing engine.
//!
//! [`run_protocol`] drives a [`Session`] from any reader and writes one
//! result line per command. The `routegraph` binary wraps it together with
//! the randomized `verify` harness.

pub mod protocol;
pub mod session;

use std::io::{BufRead, Write};

use serde_json::json;
use thiserror::Error;

use routegraph_core::Directedness;
use routegraph_query::SearchConfig;

pub use protocol::{Command, ProtocolError};
pub use session::{Reply, Session, SessionError};

/// Errors that abort a protocol run. Per-line problems do not; they are
/// reported inline and processing continues.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub directedness: Directedness,
    /// One JSON object per result instead of plain text.
    pub json: bool,
    pub search: SearchConfig,
}

/// Counts of what a run did, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub edges_loaded: usize,
    pub commands: usize,
    pub errors: usize,
}

/// Reads a whole protocol stream from `input` and answers it on `output`.
///
/// A malformed header or query-count line aborts the run; any other bad
/// line yields an `error: ...` result and the run continues.
pub fn run_protocol(
    input: impl BufRead,
    mut output: impl Write,
    options: RunOptions,
) -> Result<RunSummary, CliError> {
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !matches!(line, Ok(l) if protocol::is_blank(l)));
    let mut summary = RunSummary::default();

    let (line_no, line) = next_line(&mut lines, 1, "header")?;
    let header = protocol::parse_header(line_no, &line)?;
    let mut session = Session::new(header.node_count, options.directedness, options.search)?;
    tracing::debug!(nodes = header.node_count, edges = header.edge_count, "session started");

    let mut last = line_no;
    for _ in 0..header.edge_count {
        let (line_no, line) = next_line(&mut lines, last, "edge line")?;
        last = line_no;
        let loaded = protocol::parse_edge(line_no, &line)
            .map_err(|e| e.to_string())
            .and_then(|edge| {
                session
                    .load_edge(&edge)
                    .map_err(|e| ProtocolError::new(line_no, e.to_string()).to_string())
            });
        match loaded {
            Ok(()) => summary.edges_loaded += 1,
            Err(message) => {
                summary.errors += 1;
                write_error(&mut output, options.json, &message)?;
            }
        }
    }

    let (line_no, line) = next_line(&mut lines, last, "query count")?;
    let count = protocol::parse_count(line_no, &line)?;

    for (line_no, line) in lines.take(count) {
        let line = line?;
        summary.commands += 1;
        let reply = protocol::parse_command(line_no, &line)
            .map_err(|e| e.to_string())
            .and_then(|command| {
                session
                    .execute(&command)
                    .map_err(|e| ProtocolError::new(line_no, e.to_string()).to_string())
            });
        match reply {
            Ok(reply) if options.json => {
                writeln!(output, "{}", serde_json::to_string(&reply).map_err(std::io::Error::from)?)?
            }
            Ok(reply) => writeln!(output, "{}", reply)?,
            Err(message) => {
                summary.errors += 1;
                write_error(&mut output, options.json, &message)?;
            }
        }
    }

    tracing::debug!(
        ?summary,
        live_edges = session.store().edge_count(),
        recorded_edges = session.history().edge_count(),
        "session finished"
    );
    Ok(summary)
}

fn next_line(
    lines: &mut impl Iterator<Item = (usize, std::io::Result<String>)>,
    after: usize,
    what: &str,
) -> Result<(usize, String), CliError> {
    match lines.next() {
        Some((line_no, line)) => Ok((line_no, line?)),
        None => Err(ProtocolError::new(after, format!("missing {}", what)).into()),
    }
}

fn write_error(output: &mut impl Write, json: bool, message: &str) -> std::io::Result<()> {
    if json {
        writeln!(output, "{}", json!({ "kind": "error", "message": message }))
    } else {
        writeln!(output, "error: {}", message)
    }
}
