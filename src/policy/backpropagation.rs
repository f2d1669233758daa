//! Backpropagation policies for the UCT search

use crate::tree::Node;

/// Trait for policies that fold a playout result into a node
pub trait BackpropagationPolicy: Send + Sync {
    /// `result` is already expressed for the node's `player_just_moved`
    fn update_stats(&self, node: &mut Node, result: f64);

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn BackpropagationPolicy>;
}

/// One visit and the raw result per playout
#[derive(Debug, Clone, Default)]
pub struct StandardPolicy;

impl StandardPolicy {
    pub fn new() -> Self {
        StandardPolicy
    }
}

impl BackpropagationPolicy for StandardPolicy {
    fn update_stats(&self, node: &mut Node, result: f64) {
        node.visits += 1;
        node.wins += result;
    }

    fn clone_box(&self) -> Box<dyn BackpropagationPolicy> {
        Box::new(self.clone())
    }
}

impl BackpropagationPolicy for Box<dyn BackpropagationPolicy> {
    fn update_stats(&self, node: &mut Node, result: f64) {
        (**self).update_stats(node, result)
    }

    fn clone_box(&self) -> Box<dyn BackpropagationPolicy> {
        (**self).clone_box()
    }
}
