//! Topological ordering of open issues by their declared blockers.

use crate::blocking::index_issues;
use crate::github::issues::IssueRecord;
use crate::markdown_parser::parse_dependencies;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// Edges run from a blocking issue to the issues it blocks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DependencyGraph {
    pub dependants: BTreeMap<u64, BTreeSet<u64>>,
    pub in_degree: BTreeMap<u64, usize>,
}

impl DependencyGraph {
    /// Graph over the open issues, using only same-repository references to
    /// other open issues. Closed, missing and cross-repository references
    /// cannot hold up ordering and are left out.
    pub fn from_issues(issues: &[IssueRecord]) -> Self {
        let index = index_issues(issues);
        let mut graph = DependencyGraph::default();

        for issue in issues.iter().filter(|issue| issue.state.is_open()) {
            graph.dependants.entry(issue.number).or_default();
            graph.in_degree.entry(issue.number).or_insert(0);
        }

        for issue in issues.iter().filter(|issue| issue.state.is_open()) {
            for reference in parse_dependencies(&issue.body) {
                if reference.is_external() || reference.number == issue.number {
                    continue;
                }
                let blocker_is_open = index
                    .get(&reference.number)
                    .is_some_and(|blocker| blocker.state.is_open());
                if !blocker_is_open {
                    continue;
                }
                let added = graph
                    .dependants
                    .entry(reference.number)
                    .or_default()
                    .insert(issue.number);
                if added {
                    *graph.in_degree.entry(issue.number).or_insert(0) += 1;
                }
            }
        }

        graph
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOrder {
    /// Open issues, each after every open issue blocking it.
    pub order: Vec<u64>,
    /// Open issues that sit on, or behind, a blocking cycle.
    pub unresolved: Vec<u64>,
}

/// Orders the open issues with Kahn's algorithm, lowest number first among
/// the issues that are free at each step.
///
/// A cycle among blockers does not fail the ordering: the issues that can
/// never become free are reported in `unresolved` instead of `order`.
pub fn resolution_order(issues: &[IssueRecord]) -> ResolutionOrder {
    let graph = DependencyGraph::from_issues(issues);
    let mut in_degree = graph.in_degree.clone();

    let mut queue: BinaryHeap<Reverse<u64>> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(number, _)| Reverse(*number))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(number)) = queue.pop() {
        order.push(number);
        let Some(dependants) = graph.dependants.get(&number) else {
            continue;
        };
        for dependant in dependants {
            if let Some(degree) = in_degree.get_mut(dependant) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push(Reverse(*dependant));
                }
            }
        }
    }

    let unresolved: Vec<u64> = in_degree
        .iter()
        .filter(|(_, degree)| **degree > 0)
        .map(|(number, _)| *number)
        .collect();
    if !unresolved.is_empty() {
        tracing::warn!(
            "{} issue(s) cannot be ordered because of a blocking cycle",
            unresolved.len()
        );
    }

    ResolutionOrder { order, unresolved }
}
