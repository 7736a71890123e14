//! Line protocol parsing.
//!
//! ```text
//! N M
//! u v weight [capacity=C] [reliability=R] [toll=T]     (M lines)
//! Q
//! <command>                                            (Q lines)
//! ```
//!
//! Commands:
//!
//! - `path s d [opts]` / `cost s d [opts]` where opts are `objective=`,
//!   `max_weight=`, `min_capacity=`, `max_toll=`, `min_reliability=`,
//!   `max_hops=` and `at=`
//! - `add u v w [attrs] [at=T]`, `set u v w [attrs] [at=T]`
//! - `update u v w [at=T]`, `remove u v [at=T]`
//! - `disable u [at=T]`, `enable u [at=T]`
//!
//! Blank lines and lines starting with `#` are ignored everywhere.

use std::str::FromStr;

use thiserror::Error;

use routegraph_core::{EdgeAttrs, NodeId, Timestamp};
use routegraph_query::{Constraints, Objective};

/// A malformed protocol line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {reason}")]
pub struct ProtocolError {
    pub line: usize,
    pub reason: String,
}

impl ProtocolError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        ProtocolError {
            line,
            reason: reason.into(),
        }
    }
}

/// The `N M` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub node_count: usize,
    pub edge_count: usize,
}

/// One initial edge line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLine {
    pub u: NodeId,
    pub v: NodeId,
    pub attrs: EdgeAttrs,
}

/// Options shared by `path` and `cost`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueryOptions {
    pub objective: Objective,
    pub constraints: Constraints,
    /// Evaluate against the history as of this timestamp.
    pub at: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Path {
        source: NodeId,
        destination: NodeId,
        options: QueryOptions,
    },
    Cost {
        source: NodeId,
        destination: NodeId,
        options: QueryOptions,
    },
    Add {
        edge: EdgeLine,
        at: Option<Timestamp>,
    },
    Set {
        edge: EdgeLine,
        at: Option<Timestamp>,
    },
    Update {
        u: NodeId,
        v: NodeId,
        weight: f64,
        at: Option<Timestamp>,
    },
    Remove {
        u: NodeId,
        v: NodeId,
        at: Option<Timestamp>,
    },
    Disable {
        node: NodeId,
        at: Option<Timestamp>,
    },
    Enable {
        node: NodeId,
        at: Option<Timestamp>,
    },
}

/// Whether a line carries no content.
pub fn is_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

pub fn parse_header(line_no: usize, line: &str) -> Result<Header, ProtocolError> {
    let mut tokens = Tokens::new(line_no, line);
    let header = Header {
        node_count: tokens.next_value("node count")?,
        edge_count: tokens.next_value("edge count")?,
    };
    tokens.finish()?;
    Ok(header)
}

pub fn parse_count(line_no: usize, line: &str) -> Result<usize, ProtocolError> {
    let mut tokens = Tokens::new(line_no, line);
    let count = tokens.next_value("query count")?;
    tokens.finish()?;
    Ok(count)
}

pub fn parse_edge(line_no: usize, line: &str) -> Result<EdgeLine, ProtocolError> {
    let mut tokens = Tokens::new(line_no, line);
    let edge = tokens.edge()?;
    let mut attrs = edge.attrs;
    for (key, value) in tokens.options()? {
        apply_attr(line_no, &mut attrs, key, value)?;
    }
    Ok(EdgeLine { attrs, ..edge })
}

pub fn parse_command(line_no: usize, line: &str) -> Result<Command, ProtocolError> {
    let mut tokens = Tokens::new(line_no, line);
    let name = tokens.next_token("command")?;
    match name {
        "path" | "cost" => {
            let source = NodeId(tokens.next_value("source")?);
            let destination = NodeId(tokens.next_value("destination")?);
            let mut options = QueryOptions::default();
            for (key, value) in tokens.options()? {
                apply_query_option(line_no, &mut options, key, value)?;
            }
            Ok(if name == "path" {
                Command::Path {
                    source,
                    destination,
                    options,
                }
            } else {
                Command::Cost {
                    source,
                    destination,
                    options,
                }
            })
        }
        "add" | "set" => {
            let mut edge = tokens.edge()?;
            let mut at = None;
            for (key, value) in tokens.options()? {
                if key == "at" {
                    at = Some(Timestamp(parse_value(line_no, key, value)?));
                } else {
                    apply_attr(line_no, &mut edge.attrs, key, value)?;
                }
            }
            Ok(if name == "add" {
                Command::Add { edge, at }
            } else {
                Command::Set { edge, at }
            })
        }
        "update" => {
            let edge = tokens.edge()?;
            let at = tokens.at_only()?;
            Ok(Command::Update {
                u: edge.u,
                v: edge.v,
                weight: edge.attrs.weight,
                at,
            })
        }
        "remove" => {
            let u = NodeId(tokens.next_value("u")?);
            let v = NodeId(tokens.next_value("v")?);
            let at = tokens.at_only()?;
            Ok(Command::Remove { u, v, at })
        }
        "disable" | "enable" => {
            let node = NodeId(tokens.next_value("node")?);
            let at = tokens.at_only()?;
            Ok(if name == "disable" {
                Command::Disable { node, at }
            } else {
                Command::Enable { node, at }
            })
        }
        other => Err(ProtocolError::new(
            line_no,
            format!("unknown command '{}'", other),
        )),
    }
}

fn apply_attr(
    line_no: usize,
    attrs: &mut EdgeAttrs,
    key: &str,
    value: &str,
) -> Result<(), ProtocolError> {
    match key {
        "capacity" => attrs.capacity = Some(parse_value(line_no, key, value)?),
        "reliability" => attrs.reliability = parse_value(line_no, key, value)?,
        "toll" => attrs.toll = parse_value(line_no, key, value)?,
        other => {
            return Err(ProtocolError::new(
                line_no,
                format!("unknown edge attribute '{}'", other),
            ))
        }
    }
    Ok(())
}

fn apply_query_option(
    line_no: usize,
    options: &mut QueryOptions,
    key: &str,
    value: &str,
) -> Result<(), ProtocolError> {
    let c = &mut options.constraints;
    match key {
        "objective" => {
            options.objective = value
                .parse()
                .map_err(|e: routegraph_query::QueryError| ProtocolError::new(line_no, e.to_string()))?
        }
        "max_weight" => c.max_weight = Some(parse_value(line_no, key, value)?),
        "min_capacity" => c.min_capacity = Some(parse_value(line_no, key, value)?),
        "max_toll" => c.max_toll = Some(parse_value(line_no, key, value)?),
        "min_reliability" => c.min_reliability = Some(parse_value(line_no, key, value)?),
        "max_hops" => c.max_hops = Some(parse_value(line_no, key, value)?),
        "at" => options.at = Some(Timestamp(parse_value(line_no, key, value)?)),
        other => {
            return Err(ProtocolError::new(
                line_no,
                format!("unknown query option '{}'", other),
            ))
        }
    }
    Ok(())
}

fn parse_value<T: FromStr>(line_no: usize, what: &str, token: &str) -> Result<T, ProtocolError> {
    token
        .parse()
        .map_err(|_| ProtocolError::new(line_no, format!("invalid {} '{}'", what, token)))
}

/// Whitespace tokenizer that remembers its line number.
struct Tokens<'a> {
    line_no: usize,
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line_no: usize, line: &'a str) -> Self {
        Tokens {
            line_no,
            inner: line.split_whitespace(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str, ProtocolError> {
        self.inner
            .next()
            .ok_or_else(|| ProtocolError::new(self.line_no, format!("missing {}", what)))
    }

    fn next_value<T: FromStr>(&mut self, what: &str) -> Result<T, ProtocolError> {
        let token = self.next_token(what)?;
        parse_value(self.line_no, what, token)
    }

    /// `u v weight`
    fn edge(&mut self) -> Result<EdgeLine, ProtocolError> {
        let u = NodeId(self.next_value("u")?);
        let v = NodeId(self.next_value("v")?);
        let weight = self.next_value("weight")?;
        Ok(EdgeLine {
            u,
            v,
            attrs: EdgeAttrs::new(weight),
        })
    }

    /// Remaining `key=value` tokens.
    fn options(&mut self) -> Result<Vec<(&'a str, &'a str)>, ProtocolError> {
        let line_no = self.line_no;
        self.inner
            .by_ref()
            .map(|token| {
                token.split_once('=').ok_or_else(|| {
                    ProtocolError::new(line_no, format!("expected key=value, got '{}'", token))
                })
            })
            .collect()
    }

    fn at_only(&mut self) -> Result<Option<Timestamp>, ProtocolError> {
        let mut at = None;
        for (key, value) in self.options()? {
            if key != "at" {
                return Err(ProtocolError::new(
                    self.line_no,
                    format!("unknown option '{}'", key),
                ));
            }
            at = Some(Timestamp(parse_value(self.line_no, key, value)?));
        }
        Ok(at)
    }

    fn finish(&mut self) -> Result<(), ProtocolError> {
        match self.inner.next() {
            None => Ok(()),
            Some(extra) => Err(ProtocolError::new(
                self.line_no,
                format!("unexpected token '{}'", extra),
            )),
        }
    }
}
