//! Deterministic grid data and probabilistic resource events for a
//! lockstep-replicated simulation.
//!
//! Replicas exchange only commands and tick numbers, so everything in this
//! crate must compute bit-identical results from identical inputs:
//!
//! 1. Randomness comes from [`random::DeterministicRandom`] only, never from
//!    thread-local or time-seeded generators.
//! 2. Iteration is row-major over `Vec` storage; no hash-ordered traversal
//!    feeds simulation state.
//! 3. Extrema break ties by first occurrence.
//! 4. No wall-clock time, no I/O, no async.

pub mod analysis;
pub mod config;
pub mod depletion;
pub mod grid;
pub mod point;
pub mod random;
pub mod session;
pub mod supply;

pub use analysis::{map_value_to_index, ValueRange};
pub use config::{ConfigError, EngineConfig, ResourceConfig};
pub use depletion::{ExtractionOutcome, ResourceAmount, ResourceKind};
pub use grid::{Grid, GridError};
pub use point::{MapExtent, Point};
pub use random::{DecisionSource, DeterministicRandom, DrawSite, EntityId, RandomDecisionKey};
pub use session::{ExtractionRequest, Session, SessionError, SessionMetrics};
pub use supply::{SupplyPolicy, SupplySelection};
