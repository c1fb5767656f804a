//! Per-origin reasonable-link bushes.
//!
//! # Construction
//!
//! For origin r, an arc (i, j) is *reasonable* when the free-flow shortest
//! path labels satisfy `label[i] < label[j]` — the arc moves strictly
//! farther from the origin.  The strict inequality makes the subgraph
//! acyclic, so one topological order computed here drives every later
//! loading sweep in O(M).
//!
//! Bushes are built once from free-flow costs and never rebuilt: the
//! reasonable-link sets stay fixed while MSA re-prices the arcs.
//!
//! # Storage
//!
//! Forward and reverse reasonable stars are per-node CSR slices over
//! `ArcId`s (flat index vector + row pointer), the same layout the network
//! uses for its full adjacency.  Arc ids refer to the network's arrays;
//! the bush stores no arc attributes of its own.

use std::collections::VecDeque;

use tap_core::{ArcId, NodeId};
use tap_network::{DemandMatrix, Network};

use crate::error::{AssignError, AssignResult};
use crate::label::shortest_path_labels;

// ── Bush ──────────────────────────────────────────────────────────────────────

/// Acyclic reasonable-link subgraph for one origin.
#[derive(Debug)]
pub struct Bush {
    /// The origin zone this bush loads.
    pub origin: NodeId,

    /// All nodes in topological order of the bush; `order[0] == origin`.
    /// Nodes the bush never touches still appear, at arbitrary positions
    /// consistent with the order.
    pub order: Vec<NodeId>,

    /// Number of reasonable arcs.
    pub num_links: usize,

    /// Acyclic route count to all zones this origin sends trips to.
    /// Saturates at `u64::MAX` on very large networks.
    pub num_paths: u64,

    // Reasonable-link stars, CSR over ArcIds.
    fwd_start: Vec<u32>,
    fwd_arcs: Vec<ArcId>,
    rev_start: Vec<u32>,
    rev_arcs: Vec<ArcId>,
}

impl Bush {
    /// Reasonable arcs leaving `node`.
    #[inline]
    pub fn out_arcs(&self, node: NodeId) -> &[ArcId] {
        let start = self.fwd_start[node.index()] as usize;
        let end = self.fwd_start[node.index() + 1] as usize;
        &self.fwd_arcs[start..end]
    }

    /// Reasonable arcs entering `node`.
    #[inline]
    pub fn in_arcs(&self, node: NodeId) -> &[ArcId] {
        let start = self.rev_start[node.index()] as usize;
        let end = self.rev_start[node.index() + 1] as usize;
        &self.rev_arcs[start..end]
    }

    /// Build the bush for `origin` from the network's **current** arc costs
    /// (callers set free-flow costs first).
    pub fn build(net: &Network, origin: NodeId, demand: &DemandMatrix) -> AssignResult<Bush> {
        let n = net.node_count();
        let m = net.arc_count();

        let labels = shortest_path_labels(net, origin);

        // ── Classify arcs and count star degrees ──────────────────────────
        let mut reasonable = vec![false; m];
        let mut fwd_deg = vec![0u32; n];
        let mut rev_deg = vec![0u32; n];
        let mut num_links = 0usize;

        for a in 0..m {
            let i = net.tail[a].index();
            let j = net.head[a].index();
            if labels[i] < labels[j] {
                reasonable[a] = true;
                fwd_deg[i] += 1;
                rev_deg[j] += 1;
                num_links += 1;
            }
        }

        // ── Scatter arc ids into CSR stars ────────────────────────────────
        let fwd_start = prefix_sum(&fwd_deg);
        let rev_start = prefix_sum(&rev_deg);
        let mut fwd_arcs = vec![ArcId::INVALID; num_links];
        let mut rev_arcs = vec![ArcId::INVALID; num_links];
        let mut fwd_cursor: Vec<u32> = fwd_start[..n].to_vec();
        let mut rev_cursor: Vec<u32> = rev_start[..n].to_vec();

        for a in 0..m {
            if !reasonable[a] {
                continue;
            }
            let i = net.tail[a].index();
            let j = net.head[a].index();
            fwd_arcs[fwd_cursor[i] as usize] = ArcId(a as u32);
            fwd_cursor[i] += 1;
            rev_arcs[rev_cursor[j] as usize] = ArcId(a as u32);
            rev_cursor[j] += 1;
        }

        // ── Topological order (Kahn), origin first ────────────────────────
        let mut in_deg = rev_deg;
        debug_assert_eq!(in_deg[origin.index()], 0, "origin cannot have reasonable in-arcs");

        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::with_capacity(n);
        queue.push_back(origin);
        for v in 0..n {
            if v != origin.index() && in_deg[v] == 0 {
                queue.push_back(NodeId(v as u32));
            }
        }

        while let Some(i) = queue.pop_front() {
            order.push(i);
            let start = fwd_start[i.index()] as usize;
            let end = fwd_start[i.index() + 1] as usize;
            for &a in &fwd_arcs[start..end] {
                let j = net.head[a.index()];
                in_deg[j.index()] -= 1;
                if in_deg[j.index()] == 0 {
                    queue.push_back(j);
                }
            }
        }

        if order.len() != n {
            return Err(AssignError::CyclicBush { origin });
        }

        let mut bush = Bush {
            origin,
            order,
            num_links,
            num_paths: 0,
            fwd_start,
            fwd_arcs,
            rev_start,
            rev_arcs,
        };
        bush.num_paths = bush.count_paths(net, demand);
        Ok(bush)
    }

    /// Count acyclic routes to every zone this origin actually serves.
    ///
    /// Route counts grow exponentially with network size, hence the
    /// saturating u64 arithmetic.
    fn count_paths(&self, net: &Network, demand: &DemandMatrix) -> u64 {
        let n = net.node_count();
        let mut count = vec![0u64; n];
        count[self.origin.index()] = 1;

        for k in 1..n {
            let j = self.order[k];
            let mut c = 0u64;
            for &a in self.in_arcs(j) {
                c = c.saturating_add(count[net.tail[a.index()].index()]);
            }
            count[j.index()] = c;
        }

        let row = demand.row(self.origin.index());
        let mut total = 0u64;
        for (s, &trips) in row.iter().enumerate() {
            if trips > 0.0 {
                total = total.saturating_add(count[s]);
            }
        }
        total
    }
}

// ── Bulk construction ─────────────────────────────────────────────────────────

/// Build one bush per origin zone.
///
/// Sets every arc's cost to its free-flow value (floored at
/// `min_link_cost`) first; the network keeps those costs afterwards, which
/// is exactly the state the iteration-0 loading wants.
pub fn build_bushes(
    net: &mut Network,
    demand: &DemandMatrix,
    min_link_cost: f64,
) -> AssignResult<Vec<Bush>> {
    net.set_free_flow_costs(min_link_cost);

    let mut bushes = Vec::with_capacity(net.num_zones);
    for r in 0..net.num_zones {
        let bush = Bush::build(net, NodeId(r as u32), demand)?;
        log::debug!(
            "bush {r}: {} reasonable links, {} routes",
            bush.num_links,
            bush.num_paths
        );
        bushes.push(bush);
    }
    Ok(bushes)
}

/// Exclusive prefix sum of `deg`, one element longer.
fn prefix_sum(deg: &[u32]) -> Vec<u32> {
    let mut start = vec![0u32; deg.len() + 1];
    for (i, &d) in deg.iter().enumerate() {
        start[i + 1] = start[i] + d;
    }
    start
}
