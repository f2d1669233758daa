//! Policies for the phases of the UCT search
//!
//! - Selection policies: which child to descend into
//! - Simulation policies: how to play a position out to the end
//! - Backpropagation policies: how a playout result updates a node
//!
//! Expansion always picks an untried move uniformly at random and lives in
//! the searcher itself.

pub mod backpropagation;
pub mod selection;
pub mod simulation;

pub use backpropagation::{BackpropagationPolicy, StandardPolicy};
pub use selection::{SelectionPolicy, Ucb1Policy};
pub use simulation::{RandomPlayout, SimulationPolicy};
