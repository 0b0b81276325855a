//! Decision-making seam between the simulation and whatever controls actors.

use flap_core::Observation;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maps an observation to an action signal.
///
/// Policies are queried once per living actor per tick and must not depend
/// on call order; with the `parallel` feature they are queried from several
/// threads at once.
pub trait Policy: Send + Sync {
    fn decide(&self, observation: &Observation) -> f64;
}

impl<P: Policy + ?Sized> Policy for &P {
    fn decide(&self, observation: &Observation) -> f64 {
        (**self).decide(observation)
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn decide(&self, observation: &Observation) -> f64 {
        (**self).decide(observation)
    }
}

impl<P: Policy + ?Sized> Policy for Arc<P> {
    fn decide(&self, observation: &Observation) -> f64 {
        (**self).decide(observation)
    }
}

/// Adapter turning a closure into a policy
#[derive(Clone, Copy)]
pub struct FnPolicy<F>(pub F);

impl<F> Policy for FnPolicy<F>
where
    F: Fn(&Observation) -> f64 + Send + Sync,
{
    fn decide(&self, observation: &Observation) -> f64 {
        (self.0)(observation)
    }
}

/// Single tanh unit over the three observation inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perceptron {
    pub weights: [f64; 3],
    pub bias: f64,
}

impl Perceptron {
    pub fn new(weights: [f64; 3], bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Weights and bias drawn uniformly from `[-range, range]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, range: f64) -> Self {
        let mut draw = || rng.gen_range(-range..=range);
        Self {
            weights: [draw(), draw(), draw()],
            bias: draw(),
        }
    }
}

impl Policy for Perceptron {
    fn decide(&self, observation: &Observation) -> f64 {
        let inputs = observation.as_array();
        let sum: f64 = self
            .weights
            .iter()
            .zip(inputs.iter())
            .map(|(w, x)| w * x)
            .sum();
        (sum + self.bias).tanh()
    }
}
