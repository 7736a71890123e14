//! Protocol session: a live store plus its timestamped history.
//!
//! Every mutation is applied to the [`GraphStore`] and recorded in the
//! [`TemporalIndex`], at `at=T` when given or else at the session clock (one
//! past the latest timestamp seen). Queries run against the live store, or
//! against the history slice when they carry `at=T`.
//!
//! Parallel edges get histories of their own and availability changes are
//! recorded too, so a slice at or after the latest mutation matches the live
//! store.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use routegraph_core::{CoreError, Directedness, NodeId, Snapshot, Timestamp};
use routegraph_query::{Engine, Objective, QueryError, Route, RouteQuery, SearchConfig};
use routegraph_store::{GraphStore, TemporalIndex};

use crate::protocol::{Command, EdgeLine, QueryOptions};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reply {
    Path {
        nodes: Vec<NodeId>,
        route: Option<Route>,
    },
    Cost {
        objective: Objective,
        cost: f64,
    },
    Ok,
    Missing,
    Removed {
        count: usize,
    },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Path { nodes, .. } if nodes.is_empty() => f.write_str("none"),
            Reply::Path { nodes, .. } => {
                let ids: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                f.write_str(&ids.join(" "))
            }
            Reply::Cost { cost, .. } => write!(f, "{}", cost),
            Reply::Ok => f.write_str("ok"),
            Reply::Missing => f.write_str("missing"),
            Reply::Removed { count } => write!(f, "{}", count),
        }
    }
}

pub struct Session {
    store: GraphStore,
    history: TemporalIndex,
    engine: Engine,
    clock: Timestamp,
}

impl Session {
    pub fn new(
        node_count: usize,
        directedness: Directedness,
        config: SearchConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let store = GraphStore::new(node_count, directedness)?;
        let history = TemporalIndex::new(node_count, store.directedness())?;
        Ok(Session {
            store,
            history,
            engine: Engine::with_config(config),
            clock: Timestamp(1),
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn history(&self) -> &TemporalIndex {
        &self.history
    }

    /// Loads an initial edge, recorded at timestamp 0.
    pub fn load_edge(&mut self, edge: &EdgeLine) -> Result<(), SessionError> {
        self.store.add_edge(edge.u, edge.v, edge.attrs)?;
        self.history
            .record_insert(edge.u, edge.v, Timestamp(0), edge.attrs)?;
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> Result<Reply, SessionError> {
        match *command {
            Command::Path {
                source,
                destination,
                options,
            } => {
                let route = self.route(source, destination, &options)?;
                let nodes = route.as_ref().map(|r| r.nodes.clone()).unwrap_or_default();
                Ok(Reply::Path { nodes, route })
            }
            Command::Cost {
                source,
                destination,
                options,
            } => {
                let route = self.route(source, destination, &options)?;
                let cost = route
                    .map_or(options.objective.unreachable_sentinel(), |r| r.score);
                Ok(Reply::Cost {
                    objective: options.objective,
                    cost,
                })
            }
            Command::Add { edge, at } => {
                self.store.add_edge(edge.u, edge.v, edge.attrs)?;
                let at = self.stamp(at);
                self.history.record_insert(edge.u, edge.v, at, edge.attrs)?;
                Ok(Reply::Ok)
            }
            Command::Set { edge, at } => {
                self.store.add_or_update_edge(edge.u, edge.v, edge.attrs)?;
                let at = self.stamp(at);
                self.history.record_update(edge.u, edge.v, at, edge.attrs)?;
                Ok(Reply::Ok)
            }
            Command::Update { u, v, weight, at } => {
                if !self.store.update_edge(u, v, weight)? {
                    return Ok(Reply::Missing);
                }
                let at = self.stamp(at);
                self.history.record_weight(u, v, at, weight)?;
                Ok(Reply::Ok)
            }
            Command::Remove { u, v, at } => {
                let count = self.store.remove_edge(u, v)?;
                if count > 0 {
                    let at = self.stamp(at);
                    self.history.record_removal(u, v, at)?;
                }
                Ok(Reply::Removed { count })
            }
            Command::Disable { node, at } => self.set_available(node, false, at),
            Command::Enable { node, at } => self.set_available(node, true, at),
        }
    }

    fn route(
        &self,
        source: NodeId,
        destination: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<Route>, SessionError> {
        let snapshot: Snapshot = match options.at {
            Some(at) => self.history.snapshot_at(at),
            None => self.store.snapshot(),
        };
        let query = RouteQuery::new(source, destination)
            .with_objective(options.objective)
            .with_constraints(options.constraints);
        Ok(self.engine.route(&snapshot, &query)?)
    }

    fn set_available(
        &mut self,
        node: NodeId,
        available: bool,
        at: Option<Timestamp>,
    ) -> Result<Reply, SessionError> {
        self.store.set_node_available(node, available)?;
        let at = self.stamp(at);
        self.history.record_availability(node, at, available)?;
        Ok(Reply::Ok)
    }

    /// Timestamp for a mutation, advancing the clock past it.
    fn stamp(&mut self, at: Option<Timestamp>) -> Timestamp {
        let at = at.unwrap_or(self.clock);
        self.clock = Timestamp(self.clock.0.max(at.0.saturating_add(1)));
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_command;

    fn session() -> Session {
        let mut session = Session::new(3, Directedness::Undirected, SearchConfig::default()).unwrap();
        for (u, v, w) in [(0, 1, 10.0), (1, 2, 10.0), (0, 2, 30.0)] {
            session
                .load_edge(&EdgeLine {
                    u: NodeId(u),
                    v: NodeId(v),
                    attrs: routegraph_core::EdgeAttrs::new(w),
                })
                .unwrap();
        }
        session
    }

    fn run(session: &mut Session, line: &str) -> String {
        let command = parse_command(1, line).unwrap();
        match session.execute(&command) {
            Ok(reply) => reply.to_string(),
            Err(e) => format!("error: {}", e),
        }
    }

    #[test]
    fn detour_beats_direct_edge() {
        let mut s = session();
        assert_eq!(run(&mut s, "path 0 2"), "0 1 2");
        assert_eq!(run(&mut s, "cost 0 2"), "20");
    }

    #[test]
    fn mutations_are_visible_and_stamped() {
        let mut s = session();
        assert_eq!(run(&mut s, "update 0 1 15"), "ok");
        assert_eq!(s.history().latest_timestamp(), Some(Timestamp(1)));
        assert_eq!(run(&mut s, "cost 0 1 at=0"), "10");
        assert_eq!(run(&mut s, "cost 0 1"), "15");
        assert_eq!(run(&mut s, "update 1 1 3"), "missing");
        assert_eq!(run(&mut s, "remove 0 2"), "1");
        assert_eq!(run(&mut s, "remove 0 2"), "0");
        assert_eq!(run(&mut s, "cost 0 2 at=0"), "20");
    }

    #[test]
    fn explicit_timestamps_move_clock_forward() {
        let mut s = session();
        assert_eq!(run(&mut s, "set 0 2 1 at=10"), "ok");
        assert_eq!(run(&mut s, "set 0 2 2"), "ok");
        assert_eq!(s.history().latest_timestamp(), Some(Timestamp(11)));
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut s = session();
        assert_eq!(
            run(&mut s, "path 0 9"),
            "error: node out of range: NodeId(9) with node_count 3"
        );
    }

    #[test]
    fn disabled_node_forces_direct_edge() {
        let mut s = session();
        assert_eq!(run(&mut s, "disable 1"), "ok");
        assert_eq!(run(&mut s, "path 0 2"), "0 2");
        assert_eq!(run(&mut s, "enable 1"), "ok");
        assert_eq!(run(&mut s, "path 0 2"), "0 1 2");
    }

    #[test]
    fn latest_slice_matches_live_store() {
        let mut s = Session::new(2, Directedness::Undirected, SearchConfig::default()).unwrap();
        assert_eq!(run(&mut s, "add 0 1 5"), "ok");
        assert_eq!(run(&mut s, "add 0 1 100"), "ok");
        assert_eq!(run(&mut s, "cost 0 1"), "5");
        assert_eq!(run(&mut s, "cost 0 1 at=2"), "5");
        assert_eq!(run(&mut s, "cost 0 1 at=99"), "5");
        assert_eq!(s.history().edge_count(), s.store().edge_count());
    }

    #[test]
    fn availability_is_part_of_history() {
        let mut s = session();
        assert_eq!(run(&mut s, "disable 1"), "ok");
        assert_eq!(run(&mut s, "path 0 2 at=0"), "0 1 2");
        assert_eq!(run(&mut s, "path 0 2 at=1"), "0 2");
        assert_eq!(run(&mut s, "enable 1 at=5"), "ok");
        assert_eq!(run(&mut s, "path 0 2 at=4"), "0 2");
        assert_eq!(run(&mut s, "path 0 2 at=5"), "0 1 2");
        assert_eq!(run(&mut s, "path 0 2"), "0 1 2");
    }
}
