//! Expansion of an issue's tracked children into a classified tree.

use crate::github::client::IssueGraphClient;
use crate::status::{IssueNode, classify};
use anyhow::Result;
use std::collections::HashSet;

/// How far below the root the walk may descend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLimit {
    Unlimited,
    Levels(usize),
}

impl DepthLimit {
    /// Maps the conventional `-1` sentinel to `Unlimited`.
    pub fn from_max_depth(max_depth: i64) -> Self {
        if max_depth < 0 {
            DepthLimit::Unlimited
        } else {
            DepthLimit::Levels(max_depth as usize)
        }
    }

    fn exceeded_by(&self, depth: usize) -> bool {
        match self {
            DepthLimit::Unlimited => false,
            DepthLimit::Levels(max) => depth > *max,
        }
    }
}

struct PendingVisit {
    number: u64,
    depth: usize,
    parent: Option<usize>,
}

struct Slot {
    node: Option<IssueNode>,
    children: Vec<usize>,
}

/// Builds the tracked-issue tree below `root`.
///
/// The walk is depth-first and fetches one issue at a time. An issue already
/// visited in this walk is pruned with a warning (cycle or shared child), and
/// children beyond `limit` are pruned silently. Any fetch failure aborts the
/// whole build.
pub async fn build_hierarchy<C: IssueGraphClient>(
    client: &C,
    root: u64,
    limit: DepthLimit,
) -> Result<IssueNode> {
    let mut visited: HashSet<u64> = HashSet::new();
    let mut slots: Vec<Slot> = Vec::new();
    let mut stack = vec![PendingVisit {
        number: root,
        depth: 0,
        parent: None,
    }];

    while let Some(visit) = stack.pop() {
        if visited.contains(&visit.number) {
            tracing::warn!(
                "cycle detected: #{} already visited, pruning branch at depth {}",
                visit.number,
                visit.depth
            );
            continue;
        }
        if limit.exceeded_by(visit.depth) {
            tracing::debug!("depth limit reached at #{} (depth {})", visit.number, visit.depth);
            continue;
        }
        visited.insert(visit.number);

        let snapshot = client.fetch_issue(visit.number).await?;
        let children = snapshot.tracked_children.clone();
        let index = slots.len();
        slots.push(Slot {
            node: Some(IssueNode::from_snapshot(snapshot, visit.depth)),
            children: Vec::new(),
        });
        if let Some(parent) = visit.parent {
            slots[parent].children.push(index);
        }

        // Reversed so the first tracked child is walked first.
        for child in children.into_iter().rev() {
            stack.push(PendingVisit {
                number: child,
                depth: visit.depth + 1,
                parent: Some(index),
            });
        }
    }

    assemble(slots)
}

/// Links the flat slots into a tree, classifying each node once its
/// children are attached. Children always sit at higher indices than their
/// parent, so a reverse pass finishes every child before its parent.
fn assemble(mut slots: Vec<Slot>) -> Result<IssueNode> {
    for index in (0..slots.len()).rev() {
        let child_indices = std::mem::take(&mut slots[index].children);
        let children: Vec<IssueNode> = child_indices
            .into_iter()
            .filter_map(|child| slots[child].node.take())
            .collect();
        if let Some(node) = slots[index].node.as_mut() {
            node.children = children;
            classify(node);
        }
    }

    slots
        .first_mut()
        .and_then(|slot| slot.node.take())
        .ok_or_else(|| anyhow::anyhow!("hierarchy walk produced no root"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::issues::{IssueRecord, IssueSnapshot, IssueState};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockClient {
        issues: HashMap<u64, IssueSnapshot>,
        fetched: RefCell<Vec<u64>>,
    }

    impl MockClient {
        fn with(mut self, number: u64, state: IssueState, children: &[u64]) -> Self {
            self.issues.insert(
                number,
                IssueSnapshot {
                    number,
                    title: format!("Issue {number}"),
                    state,
                    issue_type: "Task".to_string(),
                    tracked_children: children.to_vec(),
                    tracked_parents: vec![],
                },
            );
            self
        }
    }

    impl IssueGraphClient for MockClient {
        async fn fetch_issue(&self, number: u64) -> Result<IssueSnapshot> {
            self.fetched.borrow_mut().push(number);
            self.issues
                .get(&number)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("fetch of #{number} failed"))
        }

        async fn list_issues(&self) -> Result<Vec<IssueRecord>> {
            Ok(vec![])
        }
    }

    fn numbers(nodes: &[IssueNode]) -> Vec<u64> {
        nodes.iter().map(|node| node.number).collect()
    }

    fn max_depth(node: &IssueNode) -> usize {
        let mut deepest = 0;
        node.walk(&mut |n| deepest = deepest.max(n.depth));
        deepest
    }

    #[tokio::test]
    async fn test_builds_tree_in_fetch_order() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2, 3])
            .with(2, IssueState::Open, &[4])
            .with(3, IssueState::Closed, &[])
            .with(4, IssueState::Closed, &[]);

        let root = build_hierarchy(&client, 1, DepthLimit::Unlimited).await.unwrap();

        assert_eq!(*client.fetched.borrow(), vec![1, 2, 4, 3]);
        assert_eq!(numbers(&root.children), vec![2, 3]);
        assert_eq!(numbers(&root.children[0].children), vec![4]);
        assert_eq!(root.depth, 0);
        assert_eq!(root.children[0].children[0].depth, 2);
        assert_eq!(root.total_children, 2);
        assert_eq!(root.closed_children, 1);
        assert_eq!(root.percent_complete, 50.0);
        // #2 is open with every child closed
        assert!(root.children[0].is_blocked);
        assert!(!root.children[1].is_ready);
    }

    #[tokio::test]
    async fn test_two_node_cycle_terminates() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2])
            .with(2, IssueState::Open, &[1]);

        let root = build_hierarchy(&client, 1, DepthLimit::Unlimited).await.unwrap();

        assert_eq!(numbers(&root.children), vec![2]);
        assert!(root.children[0].children.is_empty());
        assert_eq!(root.children[0].total_children, 0);
        assert!(root.children[0].is_ready);
        assert_eq!(*client.fetched.borrow(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_self_tracking_issue_terminates() {
        let client = MockClient::default().with(5, IssueState::Open, &[5]);

        let root = build_hierarchy(&client, 5, DepthLimit::Unlimited).await.unwrap();

        assert!(root.children.is_empty());
        assert!(root.is_ready);
    }

    #[tokio::test]
    async fn test_shared_child_is_visited_once() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2, 3])
            .with(2, IssueState::Open, &[4])
            .with(3, IssueState::Open, &[4])
            .with(4, IssueState::Open, &[]);

        let root = build_hierarchy(&client, 1, DepthLimit::Unlimited).await.unwrap();

        assert_eq!(numbers(&root.children[0].children), vec![4]);
        assert!(root.children[1].children.is_empty());
        assert_eq!(client.fetched.borrow().iter().filter(|n| **n == 4).count(), 1);
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2])
            .with(2, IssueState::Open, &[3])
            .with(3, IssueState::Open, &[4])
            .with(4, IssueState::Open, &[5])
            .with(5, IssueState::Open, &[]);

        let root = build_hierarchy(&client, 1, DepthLimit::Levels(2)).await.unwrap();

        assert_eq!(max_depth(&root), 2);
        assert!(!client.fetched.borrow().contains(&4));
        let deepest = &root.children[0].children[0];
        assert_eq!(deepest.number, 3);
        assert_eq!(deepest.total_children, 0);
    }

    #[tokio::test]
    async fn test_depth_zero_returns_root_only() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2])
            .with(2, IssueState::Open, &[]);

        let root = build_hierarchy(&client, 1, DepthLimit::Levels(0)).await.unwrap();

        assert!(root.children.is_empty());
        assert_eq!(*client.fetched.borrow(), vec![1]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let client = MockClient::default()
            .with(1, IssueState::Open, &[2, 3])
            .with(2, IssueState::Open, &[]);

        let result = build_hierarchy(&client, 1, DepthLimit::Unlimited).await;

        assert!(result.unwrap_err().to_string().contains("#3"));
    }

    #[test]
    fn test_depth_limit_sentinel() {
        assert_eq!(DepthLimit::from_max_depth(-1), DepthLimit::Unlimited);
        assert_eq!(DepthLimit::from_max_depth(3), DepthLimit::Levels(3));
    }
}
