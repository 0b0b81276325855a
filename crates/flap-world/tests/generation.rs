use flap_core::{EvaluatorConfig, Observation, PairSelection, RemovalCause};
use flap_world::{
    Evaluator, FnPolicy, FrameRecorder, GenerationCounter, JsonLinesSink, NoopSink, Perceptron,
    Policy, TerminationReason,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn capped_config(max_ticks: u64) -> EvaluatorConfig {
    EvaluatorConfig {
        max_ticks: Some(max_ticks),
        seed: 11,
        ..Default::default()
    }
}

fn perceptrons(seed: u64, n: usize) -> Vec<Perceptron> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| Perceptron::random(&mut rng, 0.05)).collect()
}

/// Flap whenever the actor has sunk below the middle of the gap.
fn gap_follower(observation: &Observation) -> f64 {
    // to_gap_top + to_gap_bottom == gap while inside the gap
    if observation.to_gap_top > observation.to_gap_bottom + 40.0 {
        1.0
    } else {
        0.0
    }
}

#[test]
fn test_mixed_boxed_population() {
    let evaluator = Evaluator::new(capped_config(2_000)).unwrap();
    let policies: Vec<Box<dyn Policy>> = vec![
        Box::new(FnPolicy(|_: &Observation| 0.0)),
        Box::new(FnPolicy(gap_follower)),
        Box::new(Perceptron::new([0.0; 3], 0.0)),
    ];

    let (counter, outcome) = evaluator
        .run_generation(GenerationCounter::new(), &policies, &mut NoopSink)
        .unwrap();

    assert_eq!(counter.completed(), 1);
    assert_eq!(outcome.generation, 1);
    assert_eq!(outcome.scores.len(), 3);
    // The gap follower outlives the two that never flap
    assert!(outcome.scores[1] > outcome.scores[0]);
    assert!(outcome.pipes_passed > 0);
    assert_eq!(outcome.stats.best_index, Some(1));
}

#[test]
fn test_same_seed_same_outcome() {
    let evaluator = Evaluator::new(capped_config(1_500)).unwrap();
    let policies = perceptrons(3, 20);

    let (_, a) = evaluator
        .run_generation(GenerationCounter::new(), &policies, &mut NoopSink)
        .unwrap();
    let (_, b) = evaluator
        .run_generation(GenerationCounter::new(), &policies, &mut NoopSink)
        .unwrap();

    assert_eq!(a.ticks, b.ticks);
    assert_eq!(a.scores, b.scores);
    assert_eq!(a.removals, b.removals);
}

#[test]
fn test_generation_counter_threads_through_runs() {
    let evaluator = Evaluator::new(capped_config(300)).unwrap();
    let policies = perceptrons(5, 4);

    let mut counter = GenerationCounter::new();
    let mut ordinals = Vec::new();
    for _ in 0..3 {
        let (next, outcome) = evaluator
            .run_generation(counter, &policies, &mut NoopSink)
            .unwrap();
        ordinals.push(outcome.generation);
        counter = next;
    }

    assert_eq!(ordinals, vec![1, 2, 3]);
    assert_eq!(counter.completed(), 3);
}

#[test]
fn test_pair_selection_modes_agree_for_shared_x() {
    let lead = Evaluator::new(capped_config(2_000)).unwrap();
    let per_actor = Evaluator::new(EvaluatorConfig {
        pair_selection: PairSelection::PerActor,
        ..capped_config(2_000)
    })
    .unwrap();

    let policies = vec![FnPolicy(gap_follower as fn(&Observation) -> f64); 3];
    let (_, a) = lead
        .run_generation(GenerationCounter::new(), &policies, &mut NoopSink)
        .unwrap();
    let (_, b) = per_actor
        .run_generation(GenerationCounter::new(), &policies, &mut NoopSink)
        .unwrap();

    assert_eq!(a.scores, b.scores);
    assert_eq!(a.pipes_passed, b.pipes_passed);
}

#[test]
fn test_frames_track_live_set() {
    let evaluator = Evaluator::new(capped_config(500)).unwrap();
    let policies = perceptrons(9, 12);
    let mut recorder = FrameRecorder::new();

    let (_, outcome) = evaluator
        .run_generation(GenerationCounter::new(), &policies, &mut recorder)
        .unwrap();

    assert_eq!(recorder.frames.len() as u64, outcome.ticks);
    let mut previous = policies.len();
    for frame in &recorder.frames {
        let removed_now = outcome.removals.iter().filter(|r| r.tick == frame.tick).count();
        assert_eq!(frame.birds.len(), previous - removed_now);
        assert!(!frame.pipes.is_empty());
        assert!(frame.pipes.len() <= 3);
        previous = frame.birds.len();
    }
}

#[test]
fn test_json_lines_output() {
    let evaluator = Evaluator::new(capped_config(60)).unwrap();
    let policies = vec![FnPolicy(gap_follower as fn(&Observation) -> f64)];
    let mut sink = JsonLinesSink::new(Vec::new()).every(10);

    evaluator
        .run_generation(GenerationCounter::new(), &policies, &mut sink)
        .unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let kinds: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["kind"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(kinds.last().map(String::as_str), Some("generation"));
    assert!(kinds.iter().filter(|k| *k == "frame").count() >= 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every actor is removed at most once, and its final fitness is exactly
    /// what its lifetime earned.
    #[test]
    fn fitness_matches_lifetime(seed in any::<u64>(), population in 1usize..24) {
        let evaluator = Evaluator::new(EvaluatorConfig {
            max_ticks: Some(400),
            seed,
            ..Default::default()
        })
        .unwrap();
        let policies = perceptrons(seed, population);
        let mut recorder = FrameRecorder::new();

        let (_, outcome) = evaluator
            .run_generation(GenerationCounter::new(), &policies, &mut recorder)
            .unwrap();

        let removed: HashSet<_> = outcome.removals.iter().map(|r| r.actor).collect();
        prop_assert_eq!(removed.len(), outcome.removals.len());
        prop_assert_eq!(removed.len() + outcome.survivors.len(), population);

        let mut previous_score = 0;
        let pass_ticks: Vec<u64> = recorder
            .frames
            .iter()
            .filter_map(|frame| {
                let passed = frame.score > previous_score;
                previous_score = frame.score;
                passed.then_some(frame.tick)
            })
            .collect();

        let rewards = &evaluator.config().rewards;
        for record in &outcome.removals {
            let mut passes = pass_ticks.iter().filter(|&&t| t < record.tick).count();
            let mut expected = rewards.survival * record.tick as f64;
            match record.cause {
                RemovalCause::Collision => expected -= rewards.collision_penalty,
                RemovalCause::OutOfBounds => {
                    passes += pass_ticks.iter().filter(|&&t| t == record.tick).count();
                }
            }
            expected += rewards.pass * passes as f64;
            prop_assert!((outcome.scores[record.actor.index()] - expected).abs() < 1e-6);
        }

        for actor in &outcome.survivors {
            prop_assert_eq!(outcome.reason, TerminationReason::TickLimit);
            let expected = rewards.survival * outcome.ticks as f64
                + rewards.pass * pass_ticks.len() as f64;
            prop_assert!((outcome.scores[actor.index()] - expected).abs() < 1e-6);
        }
    }
}
