//! Dial's STOCH loading over one bush.
//!
//! # Scratch discipline
//!
//! All working arrays live in one [`Scratch`] bundle sized for the network
//! and reused across origins.  Its contents are only valid from the most
//! recent [`bush_shortest_path`] / [`dial_flows`] call; callers that
//! aggregate over origins must read [`Scratch::flow`] before loading the
//! next origin.  The `parallel` feature gives each worker its own bundle.

use tap_network::{DemandMatrix, Network};

use crate::bush::Bush;

// ── Scratch ───────────────────────────────────────────────────────────────────

/// Working arrays for per-origin loading, reused across origins.
#[derive(Debug)]
pub struct Scratch {
    /// Bush shortest-path label per node; +∞ where the bush cannot reach.
    pub sp_cost: Vec<f64>,

    /// Sum of in-arc weights per node (1 at the origin).
    pub node_weight: Vec<f64>,

    /// Demand entering plus flow leaving each node.
    pub node_flow: Vec<f64>,

    /// Per-arc logit likelihood `exp(θ·(sp[head] − sp[tail] − cost))`.
    pub likelihood: Vec<f64>,

    /// Per-arc path weight (likelihood × upstream node weight).
    pub weight: Vec<f64>,

    /// Per-arc loaded flow for the current origin — the loading's output.
    pub flow: Vec<f64>,
}

impl Scratch {
    /// Allocate a bundle sized for `net`.
    pub fn for_network(net: &Network) -> Self {
        let n = net.node_count();
        let m = net.arc_count();
        Self {
            sp_cost: vec![0.0; n],
            node_weight: vec![0.0; n],
            node_flow: vec![0.0; n],
            likelihood: vec![0.0; m],
            weight: vec![0.0; m],
            flow: vec![0.0; m],
        }
    }
}

// ── Bush shortest path ────────────────────────────────────────────────────────

/// Relax the bush's reasonable arcs in topological order under the
/// network's current costs, filling `scratch.sp_cost`.
///
/// Linear in the bush size; nodes the bush cannot reach keep +∞.
pub fn bush_shortest_path(bush: &Bush, net: &Network, scratch: &mut Scratch) {
    scratch.sp_cost.fill(f64::INFINITY);
    scratch.sp_cost[bush.origin.index()] = 0.0;

    for k in 1..bush.order.len() {
        let i = bush.order[k];
        let mut best = f64::INFINITY;
        for &a in bush.in_arcs(i) {
            let via = scratch.sp_cost[net.tail[a.index()].index()] + net.cost[a.index()];
            if via < best {
                best = via;
            }
        }
        scratch.sp_cost[i.index()] = best;
    }
}

// ── Dial loading ──────────────────────────────────────────────────────────────

/// Load this bush's origin demand onto the network under logit route
/// choice with dispersion `theta`, leaving the per-arc result in
/// `scratch.flow`.
///
/// Always recomputes the bush shortest paths first, so the likelihoods are
/// defined even on the very first call after construction.  Non-reasonable
/// arcs end with zero flow.
pub fn dial_flows(
    bush: &Bush,
    net: &Network,
    demand: &DemandMatrix,
    theta: f64,
    scratch: &mut Scratch,
) {
    bush_shortest_path(bush, net, scratch);

    let r = bush.origin;
    let row = demand.row(r.index());
    let m = net.arc_count();

    scratch.flow.fill(0.0);

    // ── Step A: likelihoods ───────────────────────────────────────────────
    //
    // Computed for every arc; non-reasonable arcs get a value too but no
    // weight ever reads it.  Arcs touching an unreachable endpoint get 0
    // outright, keeping ∞ and NaN out of the scratch.
    for a in 0..m {
        let si = scratch.sp_cost[net.tail[a].index()];
        let sj = scratch.sp_cost[net.head[a].index()];
        scratch.likelihood[a] = if si.is_finite() && sj.is_finite() {
            (theta * (sj - si - net.cost[a])).exp()
        } else {
            0.0
        };
    }

    // ── Step B: forward weight sweep ──────────────────────────────────────
    //
    // In topological order every reasonable in-arc of a node is weighted
    // before the node itself is reached, so one pass suffices.
    scratch.node_weight[r.index()] = 1.0;
    for &a in bush.out_arcs(r) {
        scratch.weight[a.index()] = scratch.likelihood[a.index()];
    }
    for k in 1..bush.order.len() {
        let i = bush.order[k];
        let mut w = 0.0;
        for &a in bush.in_arcs(i) {
            w += scratch.weight[a.index()];
        }
        scratch.node_weight[i.index()] = w;
        for &a in bush.out_arcs(i) {
            scratch.weight[a.index()] = w * scratch.likelihood[a.index()];
        }
    }

    // ── Step C: reverse flow sweep ────────────────────────────────────────
    //
    // Walking the order backwards, every out-arc of a node already carries
    // its flow, so the node's total splits over its in-arcs in proportion
    // to their weights.  A zero node weight means nothing can reach the
    // node; its in-arcs stay empty.
    for k in (0..bush.order.len()).rev() {
        let i = bush.order[k];

        let mut f = if net.is_zone(i) { row[i.index()] } else { 0.0 };
        for &a in bush.out_arcs(i) {
            f += scratch.flow[a.index()];
        }
        scratch.node_flow[i.index()] = f;

        let node_weight = scratch.node_weight[i.index()];
        for &a in bush.in_arcs(i) {
            scratch.flow[a.index()] = if node_weight == 0.0 {
                0.0
            } else {
                f * scratch.weight[a.index()] / node_weight
            };
        }
    }
}
