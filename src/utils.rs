//! Helpers for the UCB1 formula
//!
//! ```text
//! UCB1 = wins / visits + C * sqrt(2 * ln(parent_visits) / visits)
//! ```

/// Average result of a node, `0.0` before its first visit
pub fn win_rate(wins: f64, visits: u64) -> f64 {
    if visits == 0 {
        return 0.0;
    }
    wins / visits as f64
}

/// Exploration bonus of a child; infinite for an unvisited child so every
/// child is tried once before any is tried twice.
pub fn exploration_term(parent_visits: u64, child_visits: u64, exploration_constant: f64) -> f64 {
    if child_visits == 0 {
        return f64::INFINITY;
    }
    exploration_constant * (2.0 * (parent_visits as f64).ln() / child_visits as f64).sqrt()
}

pub fn ucb1_value(wins: f64, visits: u64, parent_visits: u64, exploration_constant: f64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    win_rate(wins, visits) + exploration_term(parent_visits, visits, exploration_constant)
}
