//! Side-scrolling obstacle simulation used to evaluate populations of policies.
//!
//! An [`Evaluator`] runs one generation at a time: every actor falls under
//! gravity, flaps when its [`Policy`] says so, and is removed when it hits an
//! obstacle pair or leaves the playfield.

pub mod physics;
pub mod bird;
pub mod pipe;
pub mod ground;
pub mod mask;
pub mod collision;
pub mod policy;
pub mod snapshot;
pub mod generation;
pub mod evaluator;

pub use bird::Bird;
pub use pipe::PipePair;
pub use ground::Ground;
pub use mask::Mask;
pub use collision::{CollisionDetector, Silhouettes};
pub use policy::{FnPolicy, Perceptron, Policy};
pub use snapshot::{FrameRecorder, FrameSink, FrameSnapshot, JsonLinesSink, NoopSink};
pub use generation::{GenerationCounter, GenerationOutcome, RemovalRecord, TerminationReason};
pub use evaluator::{Evaluator, GenerationRun, RunState, TickReport};
