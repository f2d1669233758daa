//! Selection policies for the UCT search

use crate::tree::{NodeId, Tree};
use crate::utils;

/// Trait for policies that pick the child to descend into
pub trait SelectionPolicy: Send + Sync {
    /// Picks a child of `node`, or `None` if it has none
    fn select_child(&self, tree: &Tree, node: NodeId) -> Option<NodeId>;

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn SelectionPolicy>;
}

/// Upper Confidence Bound 1 selection
///
/// ```text
/// UCB1 = wins / visits + C * sqrt(2 * ln(parent_visits) / visits)
/// ```
///
/// `wins` are counted for the side that moved into the child, which is the
/// side choosing among the children, so the maximum is always right.
/// Unvisited children score infinity. Ties go to the earliest child.
#[derive(Debug, Clone)]
pub struct Ucb1Policy {
    /// Weight of the exploration term
    pub exploration_constant: f64,
}

impl Ucb1Policy {
    pub fn new(exploration_constant: f64) -> Self {
        Ucb1Policy {
            exploration_constant,
        }
    }

    /// UCB1 score of `child` under a parent with `parent_visits` visits
    pub fn score(&self, tree: &Tree, child: NodeId, parent_visits: u64) -> f64 {
        let node = tree.get(child);
        utils::ucb1_value(
            node.wins,
            node.visits,
            parent_visits,
            self.exploration_constant,
        )
    }
}

impl Default for Ucb1Policy {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SelectionPolicy for Ucb1Policy {
    fn select_child(&self, tree: &Tree, node: NodeId) -> Option<NodeId> {
        let parent = tree.get(node);
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &parent.children {
            let score = self.score(tree, child, parent.visits);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((child, score));
            }
        }
        best.map(|(child, _)| child)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        Box::new(self.clone())
    }
}

impl SelectionPolicy for Box<dyn SelectionPolicy> {
    fn select_child(&self, tree: &Tree, node: NodeId) -> Option<NodeId> {
        (**self).select_child(tree, node)
    }

    fn clone_box(&self) -> Box<dyn SelectionPolicy> {
        (**self).clone_box()
    }
}
