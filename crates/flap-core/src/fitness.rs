//! Fitness accumulation and generation statistics.

use serde::{Deserialize, Serialize};

/// Running fitness of one actor.
///
/// The evaluator is the only writer; the training collaborator reads the
/// final value once the generation has ended.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreAccumulator {
    value: f64,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reward(&mut self, amount: f64) {
        self.value += amount;
    }

    pub fn penalize(&mut self, amount: f64) {
        self.value -= amount;
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Summary of the scores of one finished generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub members: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
    /// Population index of the best member
    pub best_index: Option<usize>,
}

impl GenerationStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                members: 0,
                best: 0.0,
                mean: 0.0,
                worst: 0.0,
                best_index: None,
            };
        }

        let mut best_index = 0;
        let mut worst = f64::INFINITY;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best_index] {
                best_index = i;
            }
            worst = worst.min(score);
        }

        Self {
            members: scores.len(),
            best: scores[best_index],
            mean: scores.iter().sum::<f64>() / scores.len() as f64,
            worst,
            best_index: Some(best_index),
        }
    }
}

/// Aggregate over every generation a driver has run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub generations: u32,
    pub best_ever: f64,
    pub best_generation: Option<u64>,
    /// Incremental mean of each generation's mean fitness
    pub mean_of_means: f64,
    /// Most obstacle pairs cleared in a single generation
    pub max_pipes_passed: u32,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one generation into the aggregate
    pub fn update(&mut self, generation: u64, stats: &GenerationStats, pipes_passed: u32) {
        let n = self.generations as f64;
        self.mean_of_means = (self.mean_of_means * n + stats.mean) / (n + 1.0);

        if self.best_generation.is_none() || stats.best > self.best_ever {
            self.best_ever = stats.best;
            self.best_generation = Some(generation);
        }

        self.max_pipes_passed = self.max_pipes_passed.max(pipes_passed);
        self.generations += 1;
    }
}
