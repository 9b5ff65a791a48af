//! Property-based tests for prerequisite-graph validation.
//!
//! Invariants:
//! - randomly generated DAGs always validate
//! - topological order is a permutation that respects every dependency
//! - closing any generated DAG with a back-edge is always caught as a cycle

use proptest::prelude::*;

use learnpath_backend_rust::domain::DomainError;
use learnpath_backend_rust::services::dep_graph::{topological_order, validate, GraphNode};

/// Chain 0 -> 1 -> ... -> n-1 plus random forward edges. Forward-only edges
/// keep the graph acyclic by construction; the chain guarantees a path from
/// the first node to the last.
fn arb_dag() -> impl Strategy<Value = Vec<GraphNode<i32>>> {
    (3usize..12).prop_flat_map(|n| {
        let extra_edges = proptest::collection::vec(any::<bool>(), n * (n - 1) / 2);
        extra_edges.prop_map(move |bits| {
            let mut bit = bits.iter();
            let mut nodes = Vec::with_capacity(n);
            for i in 0..n {
                let mut deps = Vec::new();
                if i > 0 {
                    deps.push(format!("n{}", i - 1));
                }
                for j in 0..i.saturating_sub(1) {
                    if *bit.next().unwrap() {
                        deps.push(format!("n{j}"));
                    }
                }
                nodes.push(GraphNode {
                    id: format!("n{i}"),
                    order_key: i as i32,
                    deps,
                });
            }
            nodes
        })
    })
}

proptest! {
    #[test]
    fn random_dags_validate(nodes in arb_dag()) {
        prop_assert!(validate(&nodes).is_ok());
    }

    #[test]
    fn topological_order_is_a_consistent_permutation(nodes in arb_dag()) {
        let order: Vec<String> = topological_order(&nodes).collect();
        prop_assert_eq!(order.len(), nodes.len());

        let position = |id: &str| order.iter().position(|o| o == id).unwrap();
        for node in &nodes {
            for dep in &node.deps {
                prop_assert!(
                    position(dep) < position(&node.id),
                    "{} ordered before its prerequisite {}", node.id, dep
                );
            }
        }
    }

    #[test]
    fn back_edge_always_fails(nodes in arb_dag()) {
        let mut nodes = nodes;
        // The chain guarantees the last node transitively requires the
        // first, so this edge closes a cycle.
        let last = format!("n{}", nodes.len() - 1);
        nodes[0].deps.push(last);

        let err = validate(&nodes).unwrap_err();
        let is_cycle = matches!(err, DomainError::Cycle { .. });
        prop_assert!(is_cycle);
    }
}
