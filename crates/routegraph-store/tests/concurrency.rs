//! Concurrent readers and writers against one shared store.

use std::thread;

use routegraph_core::{EdgeAttrs, NodeId, Snapshot};
use routegraph_store::{GraphStore, SharedGraphStore};

/// Every undirected edge must appear in both directions with identical
/// attributes; a torn write would break this.
fn assert_mirrored(snapshot: &Snapshot) {
    for (from, edge) in snapshot.iter_edges() {
        let back = snapshot
            .out_edges(edge.to)
            .iter()
            .find(|e| e.edge == edge.edge && e.to == from);
        match back {
            Some(mirror) => assert_eq!(mirror.attrs, edge.attrs, "mirror of {} differs", edge.edge),
            None => panic!("edge {} from {} has no mirror", edge.edge, from),
        }
    }
}

#[test]
fn readers_never_observe_half_applied_edges() {
    let shared = SharedGraphStore::new(GraphStore::undirected(16).unwrap());

    thread::scope(|scope| {
        for writer in 0..4u32 {
            let shared = shared.clone();
            scope.spawn(move || {
                for round in 0..200u32 {
                    let u = NodeId((writer * 3 + round) % 16);
                    let v = NodeId((writer * 5 + round * 7 + 1) % 16);
                    let weight = f64::from(round % 17);
                    match round % 4 {
                        0 => {
                            shared.add_edge(u, v, EdgeAttrs::new(weight)).unwrap();
                        }
                        1 => {
                            shared.update_edge(u, v, weight + 1.0).unwrap();
                        }
                        2 => {
                            shared
                                .add_or_update_edge(u, v, EdgeAttrs::new(weight).with_toll(1.0))
                                .unwrap();
                        }
                        _ => {
                            shared.remove_edge(u, v).unwrap();
                        }
                    }
                }
            });
        }

        for _ in 0..4 {
            let shared = shared.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let snapshot = shared.current_snapshot();
                    assert_eq!(snapshot.node_count(), 16);
                    assert_mirrored(&snapshot);
                }
            });
        }
    });

    assert_mirrored(&shared.current_snapshot());
}

#[test]
fn snapshot_taken_before_mutation_is_unchanged() {
    let shared = SharedGraphStore::new(GraphStore::undirected(3).unwrap());
    shared
        .add_edge(NodeId(0), NodeId(1), EdgeAttrs::new(5.0))
        .unwrap();
    let before = shared.current_snapshot();

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || shared.remove_edge(NodeId(0), NodeId(1)).unwrap())
    };
    assert_eq!(writer.join().unwrap(), 1);

    assert_eq!(before.out_edge_count(), 2);
    assert_eq!(shared.current_snapshot().out_edge_count(), 0);
}
