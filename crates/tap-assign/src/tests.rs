//! Unit tests for tap-assign.
//!
//! All tests run on hand-crafted networks small enough to verify the
//! loadings by hand.

#[cfg(test)]
mod helpers {
    use tap_core::NodeId;
    use tap_network::{ArcSpec, DemandMatrix, Network, NetworkBuilder};

    /// An arc spec with neutral attributes; tests override what they need.
    pub fn arc(tail: u32, head: u32, fft: f64) -> ArcSpec {
        ArcSpec {
            tail: NodeId(tail),
            head: NodeId(head),
            capacity: 100.0,
            length: 1.0,
            free_flow_time: fft,
            alpha: 0.15,
            beta: 4.0,
            speed_limit: 50.0,
            toll: 0.0,
            link_type: 1,
        }
    }

    /// Scenario: one arc joining two zones.
    ///
    /// Arc 0→1: capacity 100, free-flow time 1, α 0.15, β 4.
    pub fn two_node() -> (Network, DemandMatrix) {
        let mut b = NetworkBuilder::new(2, 2, 2);
        b.add_arc(arc(0, 1, 1.0));
        let net = b.build(0.0, 0.0).unwrap();
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 1, 50.0).unwrap();
        (net, demand)
    }

    /// Scenario: two parallel arcs with constant costs.
    ///
    /// Arc a = 0→1 (cost 1) and b = 0→1 (cost 2), α = 0 so congestion never
    /// moves the costs.  Stable tail sort keeps a at ArcId 0.
    pub fn parallel_arcs(demand_trips: f64) -> (Network, DemandMatrix) {
        let mut b = NetworkBuilder::new(2, 2, 2);
        let mut fast = arc(0, 1, 1.0);
        fast.alpha = 0.0;
        let mut slow = arc(0, 1, 2.0);
        slow.alpha = 0.0;
        b.add_arc(fast);
        b.add_arc(slow);
        let net = b.build(0.0, 0.0).unwrap();
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 1, demand_trips).unwrap();
        (net, demand)
    }

    /// A Braess-style square: zones {0, 1}, through nodes {2, 3}.
    ///
    /// Free-flow times chosen so that, from origin 0, every forward arc is
    /// reasonable and the back-arc 3→2 is not:
    ///
    /// ```text
    ///   labels:  0:0   2:1   3:2   1:3
    ///   arcs:    0→2 (1)  0→3 (3)  2→3 (1)  2→1 (5)  3→1 (1)  3→2 (1)
    /// ```
    ///
    /// Routes 0→1: {0→2→1, 0→3→1, 0→2→3→1} — three bush paths.
    pub fn braess() -> (Network, DemandMatrix) {
        let mut b = NetworkBuilder::new(4, 2, 2);
        b.add_arc(arc(0, 2, 1.0));
        b.add_arc(arc(0, 3, 3.0));
        b.add_arc(arc(2, 3, 1.0));
        b.add_arc(arc(2, 1, 5.0));
        b.add_arc(arc(3, 1, 1.0));
        b.add_arc(arc(3, 2, 1.0));
        let net = b.build(0.0, 0.0).unwrap();
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 1, 6.0).unwrap();
        (net, demand)
    }

    /// Find the arc id of (tail, head); panics if absent or ambiguous use.
    pub fn find_arc(net: &Network, tail: u32, head: u32) -> tap_core::ArcId {
        net.out_arcs(NodeId(tail))
            .find(|a| net.head[a.index()] == NodeId(head))
            .expect("arc not in network")
    }
}

// ── Dijkstra labeling ─────────────────────────────────────────────────────────

#[cfg(test)]
mod label {
    use tap_core::NodeId;
    use tap_network::NetworkBuilder;

    use super::helpers::{arc, braess};
    use crate::shortest_path_labels;

    #[test]
    fn labels_on_braess() {
        let (mut net, _) = braess();
        net.set_free_flow_costs(1e-6);
        let labels = shortest_path_labels(&net, NodeId(0));
        assert_eq!(labels[0], 0.0);
        assert_eq!(labels[2], 1.0);
        assert_eq!(labels[3], 2.0);
        assert_eq!(labels[1], 3.0);
    }

    #[test]
    fn unreachable_nodes_stay_infinite() {
        // Node 2 has no in-arcs at all.
        let mut b = NetworkBuilder::new(3, 2, 2);
        b.add_arc(arc(0, 1, 1.0));
        let mut net = b.build(0.0, 0.0).unwrap();
        net.set_free_flow_costs(1e-6);
        let labels = shortest_path_labels(&net, NodeId(0));
        assert!(labels[2].is_infinite());
    }

    #[test]
    fn centroids_are_never_transited() {
        // Zones {0, 1, 2} are centroids (first through node = 3).  The walk
        // 0→1→2 would cost 2 but transits centroid 1; the legal route runs
        // 0→3→2 at cost 10.
        let mut b = NetworkBuilder::new(4, 3, 3);
        b.add_arc(arc(0, 1, 1.0));
        b.add_arc(arc(1, 2, 1.0));
        b.add_arc(arc(0, 3, 5.0));
        b.add_arc(arc(3, 2, 5.0));
        let mut net = b.build(0.0, 0.0).unwrap();
        net.set_free_flow_costs(1e-6);

        let labels = shortest_path_labels(&net, NodeId(0));
        // The centroid still receives a label of its own.
        assert_eq!(labels[1], 1.0);
        assert_eq!(labels[2], 10.0, "route must not pass through centroid 1");
    }

    #[test]
    fn origin_centroid_expands() {
        // The origin is itself a centroid but must seed the search.
        let (mut net, _) = braess();
        net.set_free_flow_costs(1e-6);
        let labels = shortest_path_labels(&net, NodeId(0));
        assert!(labels[1].is_finite());
    }
}

// ── Bush construction ─────────────────────────────────────────────────────────

#[cfg(test)]
mod bush {
    use tap_core::NodeId;
    use tap_network::{DemandMatrix, NetworkBuilder};

    use super::helpers::{arc, braess, find_arc};
    use crate::{build_bushes, shortest_path_labels};

    #[test]
    fn reasonable_links_strictly_increase_labels() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();

        // Costs are still at free flow, so the same labels reproduce.
        let labels = shortest_path_labels(&net, NodeId(0));
        let bush = &bushes[0];
        for n in 0..net.node_count() {
            for &a in bush.out_arcs(NodeId(n as u32)) {
                let i = net.tail[a.index()].index();
                let j = net.head[a.index()].index();
                assert!(labels[i] < labels[j], "arc {i}→{j} is not reasonable");
            }
        }
    }

    #[test]
    fn back_arc_is_excluded() {
        let (mut net, demand) = braess();
        let back = find_arc(&net, 3, 2);
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let toward = bushes[0].out_arcs(NodeId(3));
        assert!(!toward.contains(&back), "3→2 moves toward the origin");
        assert_eq!(bushes[0].num_links, 5);
    }

    #[test]
    fn order_starts_at_origin_and_is_topological() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();

        for bush in &bushes {
            assert_eq!(bush.order[0], bush.origin);
            assert_eq!(bush.order.len(), net.node_count());

            // Position of each node in the order.
            let mut pos = vec![usize::MAX; net.node_count()];
            for (k, &node) in bush.order.iter().enumerate() {
                assert_eq!(pos[node.index()], usize::MAX, "node repeated in order");
                pos[node.index()] = k;
            }
            for n in 0..net.node_count() {
                for &a in bush.out_arcs(NodeId(n as u32)) {
                    let i = net.tail[a.index()].index();
                    let j = net.head[a.index()].index();
                    assert!(pos[i] < pos[j], "order violates arc {i}→{j}");
                }
            }
        }
    }

    #[test]
    fn forward_and_reverse_stars_agree() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let bush = &bushes[0];

        let mut fwd: Vec<_> = (0..net.node_count())
            .flat_map(|n| bush.out_arcs(NodeId(n as u32)).to_vec())
            .collect();
        let mut rev: Vec<_> = (0..net.node_count())
            .flat_map(|n| bush.in_arcs(NodeId(n as u32)).to_vec())
            .collect();
        fwd.sort();
        rev.sort();
        assert_eq!(fwd, rev);
        assert_eq!(fwd.len(), bush.num_links);
    }

    #[test]
    fn counts_paths_to_served_zones_only() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        // Three routes 0→1 and demand only to zone 1.
        assert_eq!(bushes[0].num_paths, 3);

        // No demand out of zone 1 → no counted paths.
        assert_eq!(bushes[1].num_paths, 0);

        // Same topology, demand also to an unreachable zone contributes 0.
        let mut b = NetworkBuilder::new(3, 3, 3);
        b.add_arc(arc(0, 1, 1.0));
        let mut net = b.build(0.0, 0.0).unwrap();
        let mut d = DemandMatrix::new(3);
        d.set(0, 1, 1.0).unwrap();
        d.set(0, 2, 1.0).unwrap();
        let bushes = build_bushes(&mut net, &d, 1e-6).unwrap();
        assert_eq!(bushes[0].num_paths, 1);
    }
}

// ── Dial loading ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod dial {
    use assert_approx_eq::assert_approx_eq;
    use tap_core::NodeId;

    use super::helpers::{braess, parallel_arcs};
    use crate::{Scratch, build_bushes, bush_shortest_path, dial_flows};

    #[test]
    fn bush_shortest_path_matches_free_flow() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        bush_shortest_path(&bushes[0], &net, &mut scratch);
        assert_eq!(scratch.sp_cost[0], 0.0);
        assert_eq!(scratch.sp_cost[2], 1.0);
        assert_eq!(scratch.sp_cost[3], 2.0);
        assert_eq!(scratch.sp_cost[1], 3.0);
    }

    #[test]
    fn logit_split_on_parallel_arcs() {
        // Costs 1 and 2, θ = 1 → flow ratio e, so e/(1+e) of the 100 trips
        // take the fast arc.
        let (mut net, demand) = parallel_arcs(100.0);
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 1.0, &mut scratch);
        let e = std::f64::consts::E;
        assert_approx_eq!(scratch.flow[0], 100.0 * e / (1.0 + e), 1e-9);
        assert_approx_eq!(scratch.flow[1], 100.0 / (1.0 + e), 1e-9);
    }

    #[test]
    fn high_theta_concentrates_on_shortest() {
        let (mut net, demand) = parallel_arcs(100.0);
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 50.0, &mut scratch);
        assert!(scratch.flow[0] > 99.99, "near-AON expected, got {}", scratch.flow[0]);
    }

    #[test]
    fn low_theta_splits_by_structure_alone() {
        let (mut net, demand) = parallel_arcs(100.0);
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 1e-9, &mut scratch);
        assert_approx_eq!(scratch.flow[0], 50.0, 1e-3);
        assert_approx_eq!(scratch.flow[1], 50.0, 1e-3);
    }

    #[test]
    fn conserves_mass_at_every_node() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let bush = &bushes[0];
        let mut scratch = Scratch::for_network(&net);

        dial_flows(bush, &net, &demand, 1.0, &mut scratch);

        for n in 0..net.node_count() {
            let node = NodeId(n as u32);
            if node == bush.origin || scratch.node_weight[n] == 0.0 {
                continue;
            }
            let inflow: f64 = bush.in_arcs(node).iter().map(|a| scratch.flow[a.index()]).sum();
            let outflow: f64 = bush.out_arcs(node).iter().map(|a| scratch.flow[a.index()]).sum();
            let trips = if net.is_zone(node) { demand.demand(0, n) } else { 0.0 };
            assert_approx_eq!(inflow, scratch.node_flow[n], 1e-9);
            assert_approx_eq!(inflow, outflow + trips, 1e-9);
        }
    }

    #[test]
    fn emits_total_origin_demand() {
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 1.0, &mut scratch);
        let out: f64 = bushes[0]
            .out_arcs(NodeId(0))
            .iter()
            .map(|a| scratch.flow[a.index()])
            .sum();
        assert_approx_eq!(out, demand.total_from(0), 1e-9);
    }

    #[test]
    fn scratch_reuse_is_clean() {
        // Loading origin 1 (no demand) between two loadings of origin 0
        // must not perturb the result.
        let (mut net, demand) = braess();
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 1.0, &mut scratch);
        let first = scratch.flow.clone();
        dial_flows(&bushes[1], &net, &demand, 1.0, &mut scratch);
        dial_flows(&bushes[0], &net, &demand, 1.0, &mut scratch);
        assert_eq!(scratch.flow, first);
    }

    #[test]
    fn non_reasonable_arcs_stay_empty() {
        let (mut net, demand) = braess();
        let back = super::helpers::find_arc(&net, 3, 2);
        let bushes = build_bushes(&mut net, &demand, 1e-6).unwrap();
        let mut scratch = Scratch::for_network(&net);

        dial_flows(&bushes[0], &net, &demand, 1.0, &mut scratch);
        assert_eq!(scratch.flow[back.index()], 0.0);
    }
}

// ── MSA driver ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod msa {
    use assert_approx_eq::assert_approx_eq;
    use tap_core::{NodeId, SolverConfig};
    use tap_network::DemandMatrix;

    use super::helpers::{braess, parallel_arcs, two_node};
    use crate::{AssignError, SueSolver, avg_flow_diff};

    #[test]
    fn two_node_converges_to_demand() {
        let (net, demand) = two_node();
        let mut solver = SueSolver::new(net, demand, SolverConfig::new(1.0, 0.5)).unwrap();

        // The initial loading already carries all 50 trips.
        assert_eq!(solver.network.flow[0], 50.0);

        let stats = solver.solve();
        assert!(stats.converged);
        assert_eq!(solver.network.flow[0], 50.0);
        // 1·(1 + 0.15·(50/100)⁴)
        assert_approx_eq!(solver.network.cost[0], 1.009375, 1e-12);
    }

    #[test]
    fn constant_costs_converge_immediately() {
        let (net, demand) = parallel_arcs(100.0);
        let mut solver = SueSolver::new(net, demand, SolverConfig::new(1.0, 0.5)).unwrap();
        let stats = solver.solve();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 0);

        let e = std::f64::consts::E;
        assert_approx_eq!(solver.network.flow[0], 100.0 * e / (1.0 + e), 1e-9);
    }

    #[test]
    fn congested_network_converges() {
        // Tight capacities so congestion actually moves the split.
        let (mut net, demand) = braess();
        for c in net.capacity.iter_mut() {
            *c = 10.0;
        }
        let mut solver = SueSolver::new(net, demand, SolverConfig::new(1.0, 0.5)).unwrap();
        let stats = solver.solve();

        assert!(stats.converged, "gap {} after {} iterations", stats.avg_flow_diff, stats.iterations);
        assert!(stats.avg_flow_diff < 1e-3);

        // Every flow non-negative, and zone 1 receives all six trips.
        assert!(solver.network.flow.iter().all(|&f| f >= 0.0));
        let into_dest: f64 = (0..solver.network.arc_count())
            .filter(|&a| solver.network.head[a] == NodeId(1))
            .map(|a| solver.network.flow[a])
            .sum();
        assert_approx_eq!(into_dest, 6.0, 1e-6);
    }

    #[test]
    fn iteration_cap_terminates_without_convergence_flag() {
        let (mut net, demand) = braess();
        for c in net.capacity.iter_mut() {
            *c = 1.0; // heavy congestion
        }
        let mut config = SolverConfig::new(1.0, 0.5);
        config.max_iterations = 0;
        config.flow_tolerance = 1e-12;
        let mut solver = SueSolver::new(net, demand, config).unwrap();
        let stats = solver.solve();
        assert_eq!(stats.iterations, 0);
        assert!(!stats.converged);
    }

    #[test]
    fn rejects_zone_count_mismatch() {
        let (net, _) = two_node();
        let demand = DemandMatrix::new(3);
        let err = SueSolver::new(net, demand, SolverConfig::new(1.0, 0.5)).unwrap_err();
        assert!(matches!(err, AssignError::ZoneCountMismatch { network: 2, demand: 3 }));
    }

    #[test]
    fn rejects_invalid_config() {
        let (net, demand) = two_node();
        let err = SueSolver::new(net, demand, SolverConfig::new(1.0, 2.0)).unwrap_err();
        assert!(matches!(err, AssignError::Config(_)));
    }

    #[test]
    fn avg_flow_diff_zero_iff_equal() {
        let a = [1.0, 2.0, 3.0];
        assert_eq!(avg_flow_diff(&a, &a), 0.0);
        let b = [1.0, 2.0, 4.5];
        assert_approx_eq!(avg_flow_diff(&a, &b), 0.5, 1e-12);
        assert!(avg_flow_diff(&a, &b) > 0.0);
    }
}
