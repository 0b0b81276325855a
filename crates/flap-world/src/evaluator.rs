//! Population evaluator: runs one generation from spawn to extinction.
//!
//! Each tick works against a frozen copy of the live set. Collision and
//! out-of-bounds decisions are collected during the detection pass and
//! committed together at the end of the tick, so a removal can never cause
//! another actor to be skipped or processed twice.

use crate::bird::Bird;
use crate::collision::{CollisionDetector, Silhouettes};
use crate::generation::{GenerationCounter, GenerationOutcome, RemovalRecord, TerminationReason};
use crate::ground::Ground;
use crate::pipe::PipePair;
use crate::policy::Policy;
use crate::snapshot::{BirdFrame, FrameSink, FrameSnapshot, PipeFrame};
use flap_core::{
    Action, ActorId, Error, EvaluatorConfig, GenerationStats, Observation, PairSelection,
    PipeConfig, RemovalCause, Result, ScoreAccumulator,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, event, info, instrument, trace, Level};

pub struct Evaluator {
    config: EvaluatorConfig,
    detector: CollisionDetector,
    quit: Option<Arc<AtomicBool>>,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        config.validate()?;
        let detector = CollisionDetector::new(config.collision, &config.bird, &config.pipe);
        Ok(Self {
            config,
            detector,
            quit: None,
        })
    }

    /// Use sprite-derived silhouettes instead of the built-in shapes.
    pub fn with_silhouettes(mut self, silhouettes: Silhouettes) -> Result<Self> {
        self.detector = self.detector.with_silhouettes(silhouettes, &self.config.bird)?;
        Ok(self)
    }

    /// Flag polled once per tick; setting it ends the generation after the
    /// tick in progress.
    pub fn with_quit_signal(mut self, quit: Arc<AtomicBool>) -> Self {
        self.quit = Some(quit);
        self
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn quit_requested(&self) -> bool {
        self.quit
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Spawn a generation without running it. Useful for stepping tick by
    /// tick from a render loop.
    pub fn start<'a, P: Policy>(
        &'a self,
        counter: GenerationCounter,
        policies: &'a [P],
    ) -> Result<GenerationRun<'a, P>> {
        GenerationRun::new(self, counter.next_ordinal(), policies)
    }

    /// Evaluate one generation to termination.
    ///
    /// Returns the advanced counter along with the outcome.
    #[instrument(skip(self, policies, sink), fields(generation = counter.next_ordinal(), population = policies.len()))]
    pub fn run_generation<P: Policy>(
        &self,
        counter: GenerationCounter,
        policies: &[P],
        sink: &mut dyn FrameSink,
    ) -> Result<(GenerationCounter, GenerationOutcome)> {
        let mut run = self.start(counter, policies)?;
        let mut pacer = self.config.tick_rate_hz.map(Pacer::new);

        while run.is_running() {
            if self.quit_requested() {
                run.quit();
                break;
            }
            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }

            run.step();
            sink.on_frame(&run.frame())?;
        }

        let outcome = run.finish();
        sink.on_generation_end(&outcome)?;

        Ok((counter.advance(), outcome))
    }
}

/// Lifecycle of a generation after spawning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated(TerminationReason),
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub flaps: usize,
    pub passed: bool,
    pub removed: Vec<RemovalRecord>,
    pub alive: usize,
}

struct Member<'a, P> {
    bird: Bird,
    policy: &'a P,
    score: ScoreAccumulator,
}

/// A generation in progress.
pub struct GenerationRun<'a, P> {
    evaluator: &'a Evaluator,
    generation: u64,
    members: Vec<Member<'a, P>>,
    /// Indices into `members`, in population order
    live: Vec<usize>,
    pipes: Vec<PipePair>,
    ground: Ground,
    rng: ChaCha8Rng,
    tick: u64,
    pipes_passed: u32,
    removals: Vec<RemovalRecord>,
    state: RunState,
}

impl<'a, P: Policy> GenerationRun<'a, P> {
    fn new(evaluator: &'a Evaluator, generation: u64, policies: &'a [P]) -> Result<Self> {
        if policies.is_empty() {
            return Err(Error::InvalidPopulation("population is empty".to_string()));
        }
        if policies.len() > u32::MAX as usize {
            return Err(Error::InvalidPopulation(format!(
                "population of {} exceeds the actor id space",
                policies.len()
            )));
        }

        let config = &evaluator.config;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(generation));

        let members: Vec<Member<'a, P>> = policies
            .iter()
            .enumerate()
            .map(|(i, policy)| Member {
                bird: Bird::new(ActorId(i as u32), &config.bird),
                policy,
                score: ScoreAccumulator::new(),
            })
            .collect();
        let live = (0..members.len()).collect();

        let pipes = vec![PipePair::spawn(config.pipe.initial_x, &config.pipe, &mut rng)];
        let ground = Ground::new(config.playfield.ground_y, &config.ground);

        info!(
            event = "generation_start",
            generation,
            population = members.len(),
            seed = config.seed.wrapping_add(generation),
            "Starting generation"
        );

        Ok(Self {
            evaluator,
            generation,
            members,
            live,
            pipes,
            ground,
            rng,
            tick: 0,
            pipes_passed: 0,
            removals: Vec::new(),
            state: RunState::Running,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn alive(&self) -> usize {
        self.live.len()
    }

    pub fn pipes(&self) -> &[PipePair] {
        &self.pipes
    }

    pub fn pipes_passed(&self) -> u32 {
        self.pipes_passed
    }

    /// Current fitness of a member, alive or not
    pub fn score(&self, actor: ActorId) -> Option<f64> {
        self.members.get(actor.index()).map(|m| m.score.value())
    }

    pub fn bird(&self, actor: ActorId) -> Option<&Bird> {
        self.members.get(actor.index()).map(|m| &m.bird)
    }

    /// Stop at the next opportunity as if the quit signal had been observed.
    pub fn quit(&mut self) {
        if self.is_running() {
            self.state = RunState::Terminated(TerminationReason::Quit);
        }
    }

    /// Advance every actor, every obstacle and the ground by one tick.
    pub fn step(&mut self) -> TickReport {
        if !self.is_running() {
            return TickReport {
                tick: self.tick,
                alive: self.live.len(),
                ..Default::default()
            };
        }

        let evaluator = self.evaluator;
        let config = &evaluator.config;
        self.tick += 1;

        // Frozen view of who is alive for the whole tick
        let live = self.live.clone();
        let lead_x = self.members[live[0]].bird.x();
        let lead_pair = active_pair(&self.pipes, lead_x, &config.pipe);

        for &i in &live {
            let member = &mut self.members[i];
            member.score.reward(config.rewards.survival);
            member.bird.advance(&config.physics);
        }

        let observations: Vec<Observation> = live
            .iter()
            .map(|&i| {
                let bird = &self.members[i].bird;
                let pair = match config.pair_selection {
                    PairSelection::LeadActor => lead_pair,
                    PairSelection::PerActor => active_pair(&self.pipes, bird.x(), &config.pipe),
                };
                match pair.and_then(|p| self.pipes.get(p)) {
                    Some(pipe) => Observation::new(bird.y, pipe.gap_top(), pipe.gap_bottom()),
                    // Open sky: the whole playfield is the gap
                    None => Observation::new(bird.y, 0.0, config.playfield.ground_y),
                }
            })
            .collect();

        let policies: Vec<&P> = live.iter().map(|&i| self.members[i].policy).collect();
        let signals = decide_all(&policies, &observations);

        let mut flaps = 0;
        for (&i, signal) in live.iter().zip(signals) {
            if Action::from_signal(signal, config.decision_threshold) == Action::Flap {
                self.members[i].bird.flap(&config.physics);
                flaps += 1;
            }
        }

        self.ground.advance(&config.ground);

        // Detection pass: decisions only, nothing leaves the live set yet
        let mut removed: Vec<Option<RemovalCause>> = vec![None; self.members.len()];
        let mut pass_event = false;

        for pipe in &mut self.pipes {
            pipe.advance(&config.pipe);

            for &i in &live {
                if removed[i].is_none() && evaluator.detector.collides(&self.members[i].bird, pipe) {
                    removed[i] = Some(RemovalCause::Collision);
                }
            }

            if !pass_event && !pipe.is_passed() && lead_x > pipe.x {
                pass_event = pipe.mark_passed();
            }
        }

        for &i in &live {
            if removed[i] == Some(RemovalCause::Collision) {
                self.members[i].score.penalize(config.rewards.collision_penalty);
            }
        }

        if pass_event {
            self.pipes_passed += 1;
            for &i in &live {
                if removed[i].is_none() {
                    self.members[i].score.reward(config.rewards.pass);
                }
            }

            let pipe = PipePair::spawn(config.pipe.spawn_x, &config.pipe, &mut self.rng);
            debug!(
                event = "pipe_spawned",
                tick = self.tick,
                x = pipe.x,
                gap_top = pipe.gap_top(),
                score = self.pipes_passed,
                "Pipe passed, spawning next"
            );
            self.pipes.push(pipe);
        }

        let before = self.pipes.len();
        self.pipes.retain(|pipe| !pipe.is_offscreen(&config.pipe));
        if self.pipes.len() < before {
            trace!(tick = self.tick, retired = before - self.pipes.len(), "Retired offscreen pipes");
        }

        for &i in &live {
            if removed[i].is_none()
                && self.members[i]
                    .bird
                    .is_out_of_bounds(&config.bird, &config.playfield)
            {
                removed[i] = Some(RemovalCause::OutOfBounds);
            }
        }

        // Commit
        let mut report = TickReport {
            tick: self.tick,
            flaps,
            passed: pass_event,
            ..Default::default()
        };
        for &i in &live {
            if let Some(cause) = removed[i] {
                let member = &self.members[i];
                let record = RemovalRecord {
                    actor: member.bird.id,
                    tick: self.tick,
                    cause,
                };
                debug!(
                    event = "actor_removed",
                    actor = %member.bird.id,
                    tick = self.tick,
                    cause = %cause,
                    y = member.bird.y,
                    fitness = member.score.value(),
                    "Actor removed"
                );
                self.removals.push(record);
                report.removed.push(record);
            }
        }
        self.live.retain(|&i| removed[i].is_none());
        report.alive = self.live.len();

        trace!(
            tick = self.tick,
            alive = report.alive,
            flaps,
            pipes = self.pipes.len(),
            score = self.pipes_passed,
            "Tick complete"
        );

        if self.live.is_empty() {
            self.state = RunState::Terminated(TerminationReason::Extinct);
        } else if config.max_ticks.is_some_and(|max| self.tick >= max) {
            self.state = RunState::Terminated(TerminationReason::TickLimit);
        }

        report
    }

    /// Render state after the last committed tick
    pub fn frame(&self) -> FrameSnapshot {
        let pipe_config = &self.evaluator.config.pipe;
        FrameSnapshot {
            generation: self.generation,
            tick: self.tick,
            score: self.pipes_passed,
            birds: self
                .live
                .iter()
                .map(|&i| {
                    let member = &self.members[i];
                    BirdFrame {
                        id: member.bird.id,
                        x: member.bird.x(),
                        y: member.bird.y,
                        tilt: member.bird.tilt,
                        fitness: member.score.value(),
                    }
                })
                .collect(),
            pipes: self
                .pipes
                .iter()
                .map(|pipe| PipeFrame {
                    x: pipe.x,
                    top_y: pipe.top_y(pipe_config),
                    gap_top: pipe.gap_top(),
                    gap_bottom: pipe.gap_bottom(),
                    passed: pipe.is_passed(),
                })
                .collect(),
            ground_y: self.ground.y,
            ground_tiles: self.ground.tiles(),
        }
    }

    /// Close the generation and hand back the final scores.
    pub fn finish(self) -> GenerationOutcome {
        let reason = match self.state {
            RunState::Terminated(reason) => reason,
            RunState::Running => TerminationReason::Quit,
        };

        let scores: Vec<f64> = self.members.iter().map(|m| m.score.value()).collect();
        let stats = GenerationStats::from_scores(&scores);
        let survivors: Vec<ActorId> = self.live.iter().map(|&i| self.members[i].bird.id).collect();

        info!(
            event = "generation_summary",
            generation = self.generation,
            ticks = self.tick,
            reason = %reason,
            score = self.pipes_passed,
            survivors = survivors.len(),
            best_fitness = stats.best,
            mean_fitness = stats.mean,
            worst_fitness = stats.worst,
            "Generation complete"
        );

        event!(
            Level::INFO,
            gauge_name = "generation_best_fitness",
            gauge_value = stats.best,
            generation = self.generation,
            "Best fitness gauge"
        );

        GenerationOutcome {
            generation: self.generation,
            ticks: self.tick,
            pipes_passed: self.pipes_passed,
            reason,
            scores,
            survivors,
            removals: self.removals,
            stats,
        }
    }
}

/// First pair whose trailing edge the actor at `x` has not yet cleared.
fn active_pair(pipes: &[PipePair], x: f64, config: &PipeConfig) -> Option<usize> {
    pipes
        .iter()
        .position(|pipe| x <= pipe.trailing_edge(config))
        .or_else(|| pipes.len().checked_sub(1))
}

fn decide_all<P: Policy>(policies: &[&P], observations: &[Observation]) -> Vec<f64> {
    #[cfg(not(feature = "parallel"))]
    {
        policies
            .iter()
            .zip(observations)
            .map(|(policy, observation)| policy.decide(observation))
            .collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        policies
            .par_iter()
            .zip(observations.par_iter())
            .map(|(policy, observation)| policy.decide(observation))
            .collect()
    }
}

/// Fixed-rate tick pacing
struct Pacer {
    interval: Duration,
    next: Instant,
}

impl Pacer {
    fn new(hz: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / hz.max(1) as f64);
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        self.next = self.next.max(now) + self.interval;
    }
}
