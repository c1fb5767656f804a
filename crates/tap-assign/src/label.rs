//! Full-network shortest-path node labeling.
//!
//! Used once per origin when the bushes are built.  Only the label vector is
//! needed downstream (reasonable-link classification compares labels, never
//! paths), so no predecessor tree is kept.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tap_core::NodeId;
use tap_network::Network;

/// Dijkstra node labels from `origin` under the network's current arc costs.
///
/// Returns one label per node; nodes unreachable from `origin` keep
/// `f64::INFINITY`.
///
/// **Centroid-connector rule**: an arc into a node below
/// `first_through_node` updates that node's label but never enqueues it, so
/// centroids can end a walk without ever carrying through traffic.  The
/// origin itself is seeded into the heap regardless of its index.
///
/// Complexity O((N + M) log N).
pub fn shortest_path_labels(net: &Network, origin: NodeId) -> Vec<f64> {
    let n = net.node_count();
    let mut label = vec![f64::INFINITY; n];
    label[origin.index()] = 0.0;

    // Min-heap: (cost, node). Reverse makes BinaryHeap (max) behave as
    // min-heap; secondary key NodeId gives deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), origin)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        let cost = cost.into_inner();

        // Skip stale heap entries.
        if cost > label[node.index()] {
            continue;
        }

        for a in net.out_arcs(node) {
            let next = net.head[a.index()];
            let new_cost = cost + net.cost[a.index()];

            if new_cost < label[next.index()] {
                label[next.index()] = new_cost;
                if !net.is_centroid(next) {
                    heap.push(Reverse((OrderedFloat(new_cost), next)));
                }
            }
        }
    }

    label
}
