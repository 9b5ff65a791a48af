//! Prerequisite-graph validation and traversal.
//!
//! Pure queries over a snapshot: nothing here mutates state, so every
//! function is safe to call from any thread against cloned records.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::domain::plan::{PlanStep, StepStatus};
use crate::domain::skill::Skill;
use crate::domain::DomainError;

/// One node of a dependency graph. `deps` lists the ids that must come
/// first; `order_key` breaks ties between simultaneously-ready nodes.
#[derive(Debug, Clone)]
pub struct GraphNode<K> {
    pub id: String,
    pub order_key: K,
    pub deps: Vec<String>,
}

pub fn step_nodes(steps: &[PlanStep]) -> Vec<GraphNode<i32>> {
    steps
        .iter()
        .map(|step| GraphNode {
            id: step.id.clone(),
            order_key: step.sequence,
            deps: step.prerequisites.clone(),
        })
        .collect()
}

pub fn skill_nodes(skills: &[Skill]) -> Vec<GraphNode<String>> {
    skills
        .iter()
        .map(|skill| GraphNode {
            id: skill.id.clone(),
            order_key: skill.slug.clone(),
            deps: skill.prerequisites.clone(),
        })
        .collect()
}

const WHITE: u8 = 0;
const GRAY: u8 = 1;
const BLACK: u8 = 2;

/// Checks that the dependency relation is a DAG. On failure the error names
/// the offending cycle as the sequence of node ids that closes on itself.
/// Dependencies pointing outside the node set are the caller's problem and
/// are skipped here.
pub fn validate<K>(nodes: &[GraphNode<K>]) -> Result<(), DomainError> {
    let index: HashMap<&str, &GraphNode<K>> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut color: HashMap<&str, u8> = nodes.iter().map(|n| (n.id.as_str(), WHITE)).collect();

    for start in nodes {
        if color[start.id.as_str()] != WHITE {
            continue;
        }

        // Iterative DFS; `path` tracks the gray chain for cycle reporting.
        let mut stack: Vec<(&str, usize)> = vec![(start.id.as_str(), 0)];
        let mut path: Vec<&str> = vec![start.id.as_str()];
        color.insert(start.id.as_str(), GRAY);

        while let Some((id, next_dep)) = stack.last_mut() {
            let node = index[*id];
            if *next_dep < node.deps.len() {
                let dep = node.deps[*next_dep].as_str();
                *next_dep += 1;

                let Some(state) = color.get(dep).copied() else {
                    continue;
                };
                match state {
                    GRAY => {
                        let pos = path.iter().position(|p| *p == dep).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[pos..].iter().map(|p| p.to_string()).collect();
                        cycle.push(dep.to_string());
                        return Err(DomainError::Cycle { path: cycle });
                    }
                    WHITE => {
                        color.insert(dep, GRAY);
                        stack.push((dep, 0));
                        path.push(dep);
                    }
                    _ => {}
                }
            } else {
                color.insert(*id, BLACK);
                stack.pop();
                path.pop();
            }
        }
    }

    Ok(())
}

/// True iff every prerequisite of `step` is completed among its siblings.
/// An empty prerequisite list always unlocks; a dangling reference never
/// does.
pub fn is_unlocked(step: &PlanStep, siblings: &[PlanStep]) -> bool {
    step.prerequisites.iter().all(|prereq| {
        siblings
            .iter()
            .any(|s| &s.id == prereq && s.status == StepStatus::Completed)
    })
}

/// Lazy topological order over a snapshot. Ties between ready nodes break
/// by ascending `order_key`, which fixes the default display order. The
/// iterator is finite and owns its state; build a new one after any
/// mutation. If the snapshot contains a cycle the iterator simply ends
/// early, so run [`validate`] first when that matters.
pub fn topological_order<K: Ord + Clone>(nodes: &[GraphNode<K>]) -> TopologicalOrder<K> {
    let known: HashMap<&str, &GraphNode<K>> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut remaining: HashMap<String, usize> = HashMap::new();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for node in nodes {
        let in_set = node
            .deps
            .iter()
            .filter(|d| known.contains_key(d.as_str()))
            .collect::<Vec<_>>();
        remaining.insert(node.id.clone(), in_set.len());
        for dep in in_set {
            dependents
                .entry(dep.clone())
                .or_default()
                .push(node.id.clone());
        }
    }

    let mut ready = BinaryHeap::new();
    for node in nodes {
        if remaining[&node.id] == 0 {
            ready.push(Reverse((node.order_key.clone(), node.id.clone())));
        }
    }

    let keys = nodes
        .iter()
        .map(|n| (n.id.clone(), n.order_key.clone()))
        .collect();

    TopologicalOrder {
        ready,
        dependents,
        remaining,
        keys,
    }
}

pub struct TopologicalOrder<K: Ord> {
    ready: BinaryHeap<Reverse<(K, String)>>,
    dependents: HashMap<String, Vec<String>>,
    remaining: HashMap<String, usize>,
    keys: HashMap<String, K>,
}

impl<K: Ord + Clone> Iterator for TopologicalOrder<K> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let Reverse((_, id)) = self.ready.pop()?;
        if let Some(waiting) = self.dependents.remove(&id) {
            for dependent in waiting {
                let count = self
                    .remaining
                    .get_mut(&dependent)
                    .expect("dependent tracked");
                *count -= 1;
                if *count == 0 {
                    let key = self.keys[&dependent].clone();
                    self.ready.push(Reverse((key, dependent)));
                }
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::plan::StepKind;

    fn node(id: &str, key: i32, deps: &[&str]) -> GraphNode<i32> {
        GraphNode {
            id: id.to_string(),
            order_key: key,
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn step(id: &str, sequence: i32, status: StepStatus, prereqs: &[&str]) -> PlanStep {
        let now = Utc::now();
        PlanStep {
            id: id.to_string(),
            plan_id: "plan-1".to_string(),
            skill_id: "skill-1".to_string(),
            content_item_id: None,
            kind: StepKind::Learning,
            title: id.to_string(),
            description: None,
            effort_min: 30,
            sequence,
            status,
            due_at: None,
            completed_at: None,
            progress_percentage: if status == StepStatus::Completed { 100 } else { 0 },
            prerequisites: prereqs.iter().map(|p| p.to_string()).collect(),
            unlocks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_diamond() {
        let nodes = vec![
            node("a", 1, &[]),
            node("b", 2, &["a"]),
            node("c", 3, &["a"]),
            node("d", 4, &["b", "c"]),
        ];
        assert!(validate(&nodes).is_ok());
    }

    #[test]
    fn reports_cycle_members() {
        let nodes = vec![
            node("a", 1, &["c"]),
            node("b", 2, &["a"]),
            node("c", 3, &["b"]),
        ];
        let err = validate(&nodes).unwrap_err();
        match err {
            DomainError::Cycle { path } => {
                assert!(path.len() >= 3);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn order_breaks_ties_by_key() {
        let nodes = vec![
            node("late", 9, &[]),
            node("early", 1, &[]),
            node("mid", 5, &["early"]),
        ];
        let order: Vec<String> = topological_order(&nodes).collect();
        assert_eq!(order, vec!["early", "mid", "late"]);
    }

    #[test]
    fn order_respects_dependencies() {
        let nodes = vec![
            node("a", 4, &[]),
            node("b", 3, &["a"]),
            node("c", 2, &["b"]),
            node("d", 1, &["c"]),
        ];
        let order: Vec<String> = topological_order(&nodes).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn empty_prerequisites_always_unlocked() {
        let steps = vec![step("a", 1, StepStatus::Pending, &[])];
        assert!(is_unlocked(&steps[0], &steps));
    }

    #[test]
    fn locked_until_every_prerequisite_completes() {
        let steps = vec![
            step("a", 1, StepStatus::Pending, &[]),
            step("b", 2, StepStatus::Completed, &[]),
            step("c", 3, StepStatus::Pending, &["a", "b"]),
        ];
        assert!(!is_unlocked(&steps[2], &steps));

        let steps = vec![
            step("a", 1, StepStatus::Completed, &[]),
            step("b", 2, StepStatus::Completed, &[]),
            step("c", 3, StepStatus::Pending, &["a", "b"]),
        ];
        assert!(is_unlocked(&steps[2], &steps));
    }

    #[test]
    fn skipped_prerequisite_does_not_unlock() {
        let steps = vec![
            step("a", 1, StepStatus::Skipped, &[]),
            step("b", 2, StepStatus::Pending, &["a"]),
        ];
        assert!(!is_unlocked(&steps[1], &steps));
    }
}
