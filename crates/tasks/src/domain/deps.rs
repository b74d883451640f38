//! Report-only dependency validation.
//!
//! Nothing here modifies the graph. Dangling references, duplicate task ids
//! and dependency cycles are listed for the caller to act on.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::entities::{TaskGraph, TaskRef};

/// A dependency reference that names nothing in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Task or subtask holding the reference
    pub owner: TaskRef,
    pub reference: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} depends on missing '{}'", self.owner, self.reference)
    }
}

/// Result of dependency validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub dangling: Vec<DanglingReference>,
    pub duplicate_ids: Vec<u32>,
    pub cycles: Vec<Vec<TaskRef>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.dangling.is_empty() && self.duplicate_ids.is_empty() && self.cycles.is_empty()
    }
}

type DepGraph = HashMap<TaskRef, Vec<TaskRef>>;

/// Scan the graph for dangling references, duplicate ids and cycles.
pub fn validate(graph: &TaskGraph) -> ValidationReport {
    let mut dangling = Vec::new();
    let mut edges: DepGraph = HashMap::new();
    let mut nodes = Vec::new();

    let mut record = |owner: TaskRef, deps: &[String], edges: &mut DepGraph| {
        let targets = edges.entry(owner).or_default();
        for dep in deps {
            match graph.resolve(dep) {
                Some(target) => targets.push(target.task_ref()),
                None => dangling.push(DanglingReference {
                    owner,
                    reference: dep.clone(),
                }),
            }
        }
    };

    for task in graph.iter() {
        let owner = TaskRef::Task(task.id);
        nodes.push(owner);
        record(owner, task.dependencies.as_slice(), &mut edges);
        for subtask in &task.subtasks {
            let owner = subtask.task_ref(task.id);
            nodes.push(owner);
            record(owner, subtask.dependencies.as_slice(), &mut edges);
        }
    }

    let mut seen = HashSet::new();
    let duplicate_ids: BTreeSet<u32> = graph
        .iter()
        .map(|t| t.id)
        .filter(|id| !seen.insert(*id))
        .collect();

    ValidationReport {
        dangling,
        duplicate_ids: duplicate_ids.into_iter().collect(),
        cycles: find_cycles(&edges, &nodes),
    }
}

fn find_cycles(edges: &DepGraph, nodes: &[TaskRef]) -> Vec<Vec<TaskRef>> {
    let mut cycles = Vec::new();
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();

    for &node in nodes {
        if !visited.contains(&node) {
            let mut path = Vec::new();
            dfs_cycle(edges, node, &mut visited, &mut rec_stack, &mut path, &mut cycles);
        }
    }

    cycles
}

fn dfs_cycle(
    edges: &DepGraph,
    node: TaskRef,
    visited: &mut HashSet<TaskRef>,
    rec_stack: &mut HashSet<TaskRef>,
    path: &mut Vec<TaskRef>,
    cycles: &mut Vec<Vec<TaskRef>>,
) {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(deps) = edges.get(&node) {
        for &dep in deps {
            if !visited.contains(&dep) {
                dfs_cycle(edges, dep, visited, rec_stack, path, cycles);
            } else if rec_stack.contains(&dep) {
                if let Some(start) = path.iter().position(|&n| n == dep) {
                    let cycle = path[start..].to_vec();
                    if !cycles.contains(&cycle) {
                        cycles.push(cycle);
                    }
                }
            }
        }
    }

    path.pop();
    rec_stack.remove(&node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Subtask, Task};

    fn task(id: u32, deps: &[&str]) -> Task {
        Task::new(id, format!("Task {id}"), "d").with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_clean_graph_is_valid() {
        let graph = TaskGraph::new(vec![task(1, &[]), task(2, &["1"]), task(3, &["1", "2"])]);
        assert!(validate(&graph).is_valid());
    }

    #[test]
    fn test_dangling_references() {
        let mut parent = task(1, &["99"]);
        let mut sub = Subtask::new(1, "Sub", "d");
        sub.dependencies = vec!["1.7".to_string()];
        parent.subtasks.push(sub);
        let graph = TaskGraph::new(vec![parent]);

        let report = validate(&graph);
        assert_eq!(report.dangling.len(), 2);
        assert_eq!(report.dangling[0].owner, TaskRef::Task(1));
        assert_eq!(report.dangling[0].reference, "99");
        assert_eq!(
            report.dangling[1].owner,
            TaskRef::Subtask {
                parent: 1,
                index: 1
            }
        );
    }

    #[test]
    fn test_cycle_detection() {
        let graph = TaskGraph::new(vec![task(1, &["3"]), task(2, &["1"]), task(3, &["2"]), task(4, &["4"])]);
        let report = validate(&graph);
        assert_eq!(report.cycles.len(), 2);
        assert_eq!(
            report.cycles[0],
            vec![TaskRef::Task(1), TaskRef::Task(3), TaskRef::Task(2)]
        );
        assert_eq!(report.cycles[1], vec![TaskRef::Task(4)]);
    }

    #[test]
    fn test_cycle_through_subtask() {
        let mut parent = task(1, &[]);
        let mut sub = Subtask::new(1, "Sub", "d");
        sub.dependencies = vec!["2".to_string()];
        parent.subtasks.push(sub);
        let graph = TaskGraph::new(vec![parent, task(2, &["1.1"])]);

        let report = validate(&graph);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].len(), 2);
    }

    #[test]
    fn test_duplicate_ids() {
        let graph = TaskGraph::new(vec![task(1, &[]), task(2, &[]), task(1, &[])]);
        assert_eq!(validate(&graph).duplicate_ids, vec![1]);
    }

    #[test]
    fn test_interleaved_duplicate_ids_listed_once() {
        let graph = TaskGraph::new(
            [2, 3, 2, 3, 2].into_iter().map(|id| task(id, &[])).collect(),
        );
        assert_eq!(validate(&graph).duplicate_ids, vec![2, 3]);
    }
}
