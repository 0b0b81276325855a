//! Multi-generation driver: random search with a single elite.

use flap_core::{DriverConfig, Result, RunStats};
use flap_world::{
    Evaluator, FrameSink, GenerationCounter, GenerationOutcome, Perceptron, TerminationReason,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct Driver {
    config: DriverConfig,
    evaluator: Evaluator,
    rng: ChaCha8Rng,
    counter: GenerationCounter,
    elite: Option<Perceptron>,
    stats: RunStats,
}

impl Driver {
    pub fn new(config: DriverConfig, quit: Arc<AtomicBool>) -> Result<Self> {
        config.validate()?;
        let evaluator = Evaluator::new(config.evaluator.clone())?.with_quit_signal(quit);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            evaluator,
            rng,
            counter: GenerationCounter::new(),
            elite: None,
            stats: RunStats::new(),
        })
    }

    pub fn elite(&self) -> Option<&Perceptron> {
        self.elite.as_ref()
    }

    pub fn generations_completed(&self) -> u64 {
        self.counter.completed()
    }

    /// Next population: the elite (if any) first, the rest sampled fresh.
    pub fn sample_population(&mut self) -> Vec<Perceptron> {
        let size = self.config.population_size;
        let mut population = Vec::with_capacity(size);
        population.extend(self.elite.clone());
        while population.len() < size {
            population.push(Perceptron::random(&mut self.rng, self.config.weight_range));
        }
        population
    }

    /// Evaluate one generation and fold its result into the run.
    pub fn step(&mut self, sink: &mut dyn FrameSink) -> Result<GenerationOutcome> {
        let population = self.sample_population();
        let (counter, outcome) = self.evaluator.run_generation(self.counter, &population, sink)?;
        self.counter = counter;

        if let Some(best) = outcome.stats.best_index {
            self.elite = Some(population[best].clone());
        }
        self.stats
            .update(outcome.generation, &outcome.stats, outcome.pipes_passed);

        info!(
            generation = outcome.generation,
            best_fitness = outcome.stats.best,
            mean_fitness = outcome.stats.mean,
            pipes_passed = outcome.pipes_passed,
            best_ever = self.stats.best_ever,
            "Generation evaluated"
        );

        Ok(outcome)
    }

    /// Run until the configured number of generations or a quit.
    #[instrument(skip(self, sink), fields(generations = self.config.generations, population = self.config.population_size))]
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> Result<RunStats> {
        while self.counter.completed() < u64::from(self.config.generations) {
            let outcome = self.step(sink)?;
            if outcome.reason == TerminationReason::Quit {
                info!(generation = outcome.generation, "Quit requested, stopping run");
                break;
            }
        }

        info!(
            generations = self.stats.generations,
            best_ever = self.stats.best_ever,
            best_generation = ?self.stats.best_generation,
            max_pipes_passed = self.stats.max_pipes_passed,
            "Run complete"
        );

        Ok(self.stats.clone())
    }
}
