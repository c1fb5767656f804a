//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing arcs,
//! structure-of-arrays throughout.  Given a `NodeId n`, its outgoing arcs
//! occupy the `ArcId` range:
//!
//! ```text
//! out_start[n] .. out_start[n+1]
//! ```
//!
//! All per-arc arrays (`tail`, `head`, `capacity`, `flow`, `cost`, …) are
//! sorted by tail node and indexed by `ArcId`.  Iteration over a node's
//! outgoing arcs is therefore a contiguous memory scan — ideal for the
//! shortest-path and loading inner loops, which touch every arc thousands
//! of times per run.
//!
//! # Mutable state
//!
//! Topology and arc attributes are immutable after [`NetworkBuilder::build`].
//! Only `flow` and `cost` change during assignment: the solver writes flows,
//! [`Network::update_costs`] refreshes costs from them.
//!
//! # Zones and centroids
//!
//! Zones occupy node indices `0..num_zones`.  Nodes below
//! `first_through_node` are centroids: they may start or end a trip but may
//! never be transited, a rule enforced by the shortest-path labeler rather
//! than by the topology.

use tap_core::{ArcId, NodeId};

use crate::bpr::BprKind;
use crate::error::{NetworkError, NetworkResult};

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format with per-arc congestion state.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`NetworkBuilder`].
#[derive(Debug)]
pub struct Network {
    // ── Dimensions ────────────────────────────────────────────────────────
    /// Number of zones; zone nodes are `0..num_zones`.
    pub num_zones: usize,

    /// Nodes below this index are centroids and may not be transited.
    pub first_through_node: usize,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing arcs of node `n` are at ArcIds
    /// `out_start[n] .. out_start[n+1]`.  Length = `node_count + 1`.
    pub out_start: Vec<u32>,

    // ── Arc attributes (indexed by ArcId = position in sorted order) ──────
    /// Tail (source) node of each arc.  Redundant with CSR but required
    /// when sweeping arcs without their owning node at hand.
    pub tail: Vec<NodeId>,

    /// Head (destination) node of each arc.
    pub head: Vec<NodeId>,

    /// Practical capacity, strictly positive.
    pub capacity: Vec<f64>,

    /// Physical length, in the link file's distance unit.
    pub length: Vec<f64>,

    /// Uncongested travel time.
    pub free_flow_time: Vec<f64>,

    /// BPR α coefficient.
    pub alpha: Vec<f64>,

    /// BPR β exponent.
    pub beta: Vec<f64>,

    /// Posted speed limit (carried through from the file, unused by the
    /// solver).
    pub speed_limit: Vec<f64>,

    /// Per-arc toll, combined into `fixed_cost` at build.
    pub toll: Vec<f64>,

    /// Link classification code from the file.
    pub link_type: Vec<i32>,

    /// `length · distance_factor + toll · toll_factor`, set once at build.
    pub fixed_cost: Vec<f64>,

    /// Cost-function variant bound from β at build.
    pub cost_fn: Vec<BprKind>,

    // ── Mutable assignment state ──────────────────────────────────────────
    /// Current link flow, non-negative.
    pub flow: Vec<f64>,

    /// Current link cost, refreshed by [`update_costs`](Self::update_costs).
    pub cost: Vec<f64>,
}

impl Network {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.out_start.len() - 1
    }

    pub fn arc_count(&self) -> usize {
        self.head.len()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `ArcId`s of all outgoing arcs from `node`.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn out_arcs(&self, node: NodeId) -> impl Iterator<Item = ArcId> + '_ {
        let start = self.out_start[node.index()] as usize;
        let end = self.out_start[node.index() + 1] as usize;
        (start..end).map(|i| ArcId(i as u32))
    }

    /// `true` if `node` is a zone (a potential trip end).
    #[inline]
    pub fn is_zone(&self, node: NodeId) -> bool {
        node.index() < self.num_zones
    }

    /// `true` if `node` is a centroid, barred from carrying through traffic.
    #[inline]
    pub fn is_centroid(&self, node: NodeId) -> bool {
        node.index() < self.first_through_node
    }

    // ── Cost state ────────────────────────────────────────────────────────

    /// Refresh every arc's `cost` from its bound BPR evaluator and the
    /// current `flow`.  Idempotent while flows are unchanged.
    pub fn update_costs(&mut self) {
        for a in 0..self.arc_count() {
            self.cost[a] = self.cost_fn[a].eval(
                self.fixed_cost[a],
                self.free_flow_time[a],
                self.alpha[a],
                self.beta[a],
                self.capacity[a],
                self.flow[a],
            );
        }
    }

    /// Set every arc's `cost` to its free-flow value, floored at
    /// `min_link_cost` so zero-cost cycles cannot arise.
    pub fn set_free_flow_costs(&mut self, min_link_cost: f64) {
        for a in 0..self.arc_count() {
            self.cost[a] = (self.fixed_cost[a] + self.free_flow_time[a]).max(min_link_cost);
        }
    }

    /// Total system cost `Σ flow·cost` under the current state.
    pub fn total_cost(&self) -> f64 {
        self.flow
            .iter()
            .zip(&self.cost)
            .map(|(f, c)| f * c)
            .sum()
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// One raw arc as read from a link file, before CSR construction.
#[derive(Clone, Debug)]
pub struct ArcSpec {
    pub tail: NodeId,
    pub head: NodeId,
    pub capacity: f64,
    pub length: f64,
    pub free_flow_time: f64,
    pub alpha: f64,
    pub beta: f64,
    pub speed_limit: f64,
    pub toll: f64,
    pub link_type: i32,
}

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts arcs in any order.  `build()` validates capacities,
/// sorts arcs by tail node, constructs the CSR row pointer, computes each
/// arc's fixed cost from the supplied factors, and binds the BPR variant
/// from β.
pub struct NetworkBuilder {
    node_count: usize,
    num_zones: usize,
    first_through_node: usize,
    arcs: Vec<ArcSpec>,
}

impl NetworkBuilder {
    /// Start a builder for a graph of `node_count` nodes, of which the first
    /// `num_zones` are zones and the first `first_through_node` are
    /// centroids.
    pub fn new(node_count: usize, num_zones: usize, first_through_node: usize) -> Self {
        Self {
            node_count,
            num_zones,
            first_through_node,
            arcs: Vec::new(),
        }
    }

    /// Pre-allocate for the expected number of arcs to reduce reallocations
    /// when bulk-loading from a file.
    pub fn with_arc_capacity(mut self, arcs: usize) -> Self {
        self.arcs.reserve(arcs);
        self
    }

    /// Add a directed arc.
    pub fn add_arc(&mut self, spec: ArcSpec) {
        self.arcs.push(spec);
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Consume the builder and produce a [`Network`].
    ///
    /// `distance_factor` and `toll_factor` enter each arc's fixed cost as
    /// `length · distance_factor + toll · toll_factor`.  Rejects arcs with
    /// non-positive capacity.
    ///
    /// Time complexity: O(M log M) for the arc sort.
    pub fn build(self, distance_factor: f64, toll_factor: f64) -> NetworkResult<Network> {
        let node_count = self.node_count;
        let arc_count = self.arcs.len();

        for (i, a) in self.arcs.iter().enumerate() {
            if a.capacity <= 0.0 {
                return Err(NetworkError::NonPositiveCapacity {
                    arc: i,
                    capacity: a.capacity,
                });
            }
        }

        // Sort arcs by tail node for CSR construction.
        let mut raw = self.arcs;
        raw.sort_by_key(|a| a.tail.0);

        // Build CSR row pointer.
        let mut out_start = vec![0u32; node_count + 1];
        for a in &raw {
            out_start[a.tail.index() + 1] += 1;
        }
        for i in 1..=node_count {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[node_count] as usize, arc_count);

        // Scatter attributes into SoA arrays.
        let fixed_cost: Vec<f64> = raw
            .iter()
            .map(|a| a.length * distance_factor + a.toll * toll_factor)
            .collect();
        let cost_fn: Vec<BprKind> = raw.iter().map(|a| BprKind::from_beta(a.beta)).collect();

        Ok(Network {
            num_zones: self.num_zones,
            first_through_node: self.first_through_node,
            out_start,
            tail: raw.iter().map(|a| a.tail).collect(),
            head: raw.iter().map(|a| a.head).collect(),
            capacity: raw.iter().map(|a| a.capacity).collect(),
            length: raw.iter().map(|a| a.length).collect(),
            free_flow_time: raw.iter().map(|a| a.free_flow_time).collect(),
            alpha: raw.iter().map(|a| a.alpha).collect(),
            beta: raw.iter().map(|a| a.beta).collect(),
            speed_limit: raw.iter().map(|a| a.speed_limit).collect(),
            toll: raw.iter().map(|a| a.toll).collect(),
            link_type: raw.iter().map(|a| a.link_type).collect(),
            fixed_cost,
            cost_fn,
            flow: vec![0.0; arc_count],
            cost: vec![0.0; arc_count],
        })
    }
}
