//! Simulation policies for the UCT search

use rand::RngCore;

use crate::game_state::SquavaState;

/// Trait for policies that play a position out
pub trait SimulationPolicy: Send + Sync {
    /// Plays `state` forward until the game is decided
    fn simulate(&self, state: &mut SquavaState, rng: &mut dyn RngCore);

    /// Create a boxed clone of this policy
    fn clone_box(&self) -> Box<dyn SimulationPolicy>;
}

/// Uniformly random legal moves until someone wins, loses or the board fills
#[derive(Debug, Clone, Default)]
pub struct RandomPlayout;

impl RandomPlayout {
    pub fn new() -> Self {
        RandomPlayout
    }
}

impl SimulationPolicy for RandomPlayout {
    fn simulate(&self, state: &mut SquavaState, rng: &mut dyn RngCore) {
        state.random_playout(rng);
    }

    fn clone_box(&self) -> Box<dyn SimulationPolicy> {
        Box::new(self.clone())
    }
}

impl SimulationPolicy for Box<dyn SimulationPolicy> {
    fn simulate(&self, state: &mut SquavaState, rng: &mut dyn RngCore) {
        (**self).simulate(state, rng)
    }

    fn clone_box(&self) -> Box<dyn SimulationPolicy> {
        (**self).clone_box()
    }
}
