pub mod bounds;
pub mod error;
pub mod evaluation;
pub mod optimizer;
pub mod pareto;
pub mod penalty;
pub mod rng;
pub mod store;

// Re-export commonly used types for convenience
pub use bounds::Bounds;
pub use error::{BoundsKind, BoxError, OptimizerError, Result, ResultExt};
pub use evaluation::{Evaluation, Evaluator, FnEvaluator};
pub use optimizer::{Archive, GaOptions, Optimizer, Problem, GA};
pub use penalty::PenaltyPolicy;
pub use rng::RandomNumberGenerator;
pub use store::{ArchiveStore, GenerationSnapshot, MemoryStore};
