//! Exercises the public `Solver` API end to end: circuits, paths, tree/clique
//! partitions, and the trail's backtrack correctness, the same surface an
//! external model author would drive.
//!
//! Held-Karp's bound quality against TSPLIB instances needs an instance-file
//! reader this crate doesn't provide (see `DESIGN.md`), so it has no test
//! here; `held_karp.rs`'s own unit tests cover the one-tree construction.

use graphcp::branching::FirstFailBrancher;
use graphcp::results::OptimisationResult;
use graphcp::variables::IntegerVariable;
use graphcp::Solver;

#[test]
fn cycle_n4_uniform_weight_has_optimum_four_with_three_solutions() {
    let mut solver = Solver::default();
    let graph = solver.graph_var(4, false).unwrap();
    let cost = solver.int_var(0, 4).unwrap();
    let weights = vec![vec![1; 4]; 4];
    solver.tsp(graph, cost, weights).unwrap();

    let mut brancher = FirstFailBrancher;
    let mut solution_count = 0;
    solver.find_all_solutions(&mut brancher, |_| solution_count += 1);

    // Every Hamiltonian cycle on 4 nodes uses exactly 4 unit-weight edges,
    // so every found solution is already optimal; (4-1)!/2 = 3 distinct
    // cycles exist up to rotation and direction.
    assert_eq!(solution_count, 3);
}

#[test]
fn path_n5_directed_abs_diff_cost_has_unique_optimal_path() {
    let mut solver = Solver::default();
    let graph = solver.graph_var(5, true).unwrap();
    let cost = solver.int_var(0, 100).unwrap();
    let weights: Vec<Vec<i32>> = (0..5)
        .map(|i| (0..5).map(|j| (i as i32 - j as i32).abs()).collect())
        .collect();
    solver.atsp(graph, cost, weights, 0, 4).unwrap();

    let mut brancher = FirstFailBrancher;
    match solver.find_optimal(&mut brancher, cost, false) {
        OptimisationResult::Optimal {
            solution,
            objective_value,
        } => {
            assert_eq!(objective_value, 4);
            let mut arcs = solution.graph(graph.id()).arcs.clone();
            arcs.sort_unstable();
            assert_eq!(arcs, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);
        }
        other => panic!("expected a unique optimal path, got {other:?}"),
    }
}

#[test]
fn n_cliques_two_triangles_force_k_to_two() {
    let mut solver = Solver::default();
    let graph = solver.graph_var(6, false).unwrap();
    let k = solver.int_var(1, 6).unwrap();
    solver.n_cliques(graph, k).unwrap();

    // Split the envelope into the two triangles the scenario describes, so
    // the partition they imply is the only one left once propagation runs.
    let cluster_a = [0usize, 1, 2];
    let cluster_b = [3usize, 4, 5];
    for &u in &cluster_a {
        for &v in &cluster_b {
            solver.exclude_arc(graph, u, v).unwrap();
        }
    }
    for &(u, v) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
        solver.fix_arc(graph, u, v).unwrap();
    }
    solver.propagate().unwrap();

    assert_eq!(k.lower_bound(solver.assignments_state()), 2);
    assert_eq!(k.upper_bound(solver.assignments_state()), 2);
}

#[test]
fn n_trees_k_two_allows_two_roots_but_not_three() {
    let mut solver = Solver::default();
    let graph = solver.graph_var(4, true).unwrap();
    let k = solver.int_var(0, 2).unwrap();
    solver.n_trees(graph, k).unwrap();

    solver.fix_arc(graph, 0, 0).unwrap();
    solver.fix_arc(graph, 1, 1).unwrap();
    solver.propagate().unwrap();
    assert_eq!(k.lower_bound(solver.assignments_state()), 2);

    // k is now pinned at exactly 2, so every other node's self-loop was
    // already pruned from the envelope — a third root is not just
    // contradictory, it is no longer even a reachable arc.
    assert!(!graph.arc_in_envelope(solver.graph_state(), 2, 2));
    assert!(solver.fix_arc(graph, 2, 2).is_err());
}

#[test]
fn backtracking_restores_a_view_s_bound_through_the_trail() {
    let mut solver = Solver::default();
    let x = solver.int_var(0, 5).unwrap();
    let y = x.offset(1);
    assert_eq!(y.lower_bound(solver.assignments_state()), 1);

    let _world = solver.push_world();
    solver.update_lower_bound(&x, 3).unwrap();
    assert_eq!(y.lower_bound(solver.assignments_state()), 4);

    solver.pop_world();
    assert_eq!(y.lower_bound(solver.assignments_state()), 1);
}
