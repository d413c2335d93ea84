use crate::github::issues::{IssueSnapshot, IssueState};
use serde::Serialize;

/// An issue placed in a hierarchy tree, with its completion metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub issue_type: String,
    pub depth: usize,
    pub parent_count: usize,
    pub total_children: usize,
    pub closed_children: usize,
    pub percent_complete: f64,
    pub is_blocked: bool,
    pub is_ready: bool,
    pub children: Vec<IssueNode>,
}

impl IssueNode {
    /// Creates an unclassified node from a fetched issue.
    pub fn from_snapshot(snapshot: IssueSnapshot, depth: usize) -> Self {
        IssueNode {
            number: snapshot.number,
            title: snapshot.title,
            state: snapshot.state,
            issue_type: snapshot.issue_type,
            depth,
            parent_count: snapshot.tracked_parents.len(),
            total_children: 0,
            closed_children: 0,
            percent_complete: 0.0,
            is_blocked: false,
            is_ready: false,
            children: Vec::new(),
        }
    }

    /// Visits this node and every descendant in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a IssueNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Rounds a ratio to a percentage with one decimal, ties to even.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let scaled = part as f64 / total as f64 * 1000.0;
    scaled.round_ties_even() / 10.0
}

/// Computes the derived metrics of `node` from its immediate children.
///
/// Grandchildren and ancestors play no part: a parent whose children are all
/// closed is blocked on its own closure even if it is deep in the tree.
pub fn classify(node: &mut IssueNode) {
    node.total_children = node.children.len();

    if node.total_children > 0 {
        node.closed_children = node
            .children
            .iter()
            .filter(|child| child.state == IssueState::Closed)
            .count();
        node.percent_complete = percent(node.closed_children, node.total_children);
        node.is_blocked =
            node.state == IssueState::Open && node.closed_children == node.total_children;
        node.is_ready = false;
    } else {
        node.closed_children = 0;
        node.percent_complete = match node.state {
            IssueState::Closed => 100.0,
            IssueState::Open => 0.0,
        };
        node.is_blocked = false;
        node.is_ready = node.state == IssueState::Open;
    }
}

/// Aggregate counts over a classified tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DagSummary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub blocked: usize,
    pub ready: usize,
    pub max_depth: usize,
    pub root_percent_complete: f64,
}

pub fn summarize(root: &IssueNode) -> DagSummary {
    let mut summary = DagSummary {
        total: 0,
        open: 0,
        closed: 0,
        blocked: 0,
        ready: 0,
        max_depth: 0,
        root_percent_complete: root.percent_complete,
    };

    root.walk(&mut |node| {
        summary.total += 1;
        match node.state {
            IssueState::Open => summary.open += 1,
            IssueState::Closed => summary.closed += 1,
        }
        if node.is_blocked {
            summary.blocked += 1;
        }
        if node.is_ready {
            summary.ready += 1;
        }
        summary.max_depth = summary.max_depth.max(node.depth);
    });

    summary
}
