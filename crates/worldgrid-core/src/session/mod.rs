pub mod metrics;

pub use metrics::*;

use crate::config::{ConfigError, EngineConfig};
use crate::depletion::{self, ExtractionOutcome, ResourceAmount, ResourceKind};
use crate::grid::{Grid, GridError};
use crate::point::{MapExtent, Point};
use crate::random::{mix64, DeterministicRandom, EntityId, RandomSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// One extraction attempt by an entity working around `center`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub entity: EntityId,
    pub center: Point,
    pub radius: u32,
    pub kind: ResourceKind,
}

/// Simulation-side owner of a resource grid and the random stream deciding
/// its depletion. All mutation happens through ordered calls on the single
/// simulation thread, so replicas fed the same requests stay identical.
pub struct Session {
    pub(crate) config: EngineConfig,
    pub(crate) resources: Grid<ResourceAmount>,
    pub(crate) rng: DeterministicRandom,
    pub(crate) tick: u64,
    pub(crate) counters: ExtractionCounters,
}

impl Session {
    pub fn new(config: EngineConfig, resources: Grid<ResourceAmount>) -> Self {
        Self::try_new(config, resources).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(
        config: EngineConfig,
        resources: Grid<ResourceAmount>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        info!(
            seed = config.seed,
            width = resources.width(),
            height = resources.height(),
            supply = config.resources.supply.0,
            inexhaustible = config.resources.inexhaustible_mines,
            "session created"
        );
        Ok(Self {
            rng: DeterministicRandom::with_history_capacity(config.seed, config.history_capacity),
            config,
            resources,
            tick: 0,
            counters: ExtractionCounters::default(),
        })
    }

    /// Builds the resource grid from row-major amounts.
    pub fn from_amounts(
        config: EngineConfig,
        extent: MapExtent,
        amounts: Vec<ResourceAmount>,
    ) -> Result<Self, SessionError> {
        let resources = Grid::from_vec(extent, amounts)?;
        Self::try_new(config, resources)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resources(&self) -> &Grid<ResourceAmount> {
        &self.resources
    }

    pub fn random(&self) -> &DeterministicRandom {
        &self.rng
    }

    pub fn random_snapshot(&self) -> RandomSnapshot {
        self.rng.snapshot()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.rng.begin_tick(self.tick);
        self.tick
    }

    /// Locates a non-empty cell around the request's center and applies one
    /// extraction event to it. Returns `None`, without drawing, when no cell in
    /// range holds resources.
    pub fn extract(&mut self, request: ExtractionRequest) -> Option<ExtractionOutcome> {
        let Some(point) =
            depletion::find_point_with_resource(&self.resources, request.center, request.radius)
        else {
            self.counters.failed_lookups += 1;
            return None;
        };
        let outcome = depletion::deplete(
            &self.config.resources,
            &mut self.resources,
            point,
            request.kind,
            request.entity,
            &mut self.rng,
        );
        self.counters.record(&outcome);
        Some(outcome)
    }

    /// Digest of the tick, the random stream and every resource cell.
    /// Replicas exchange it to detect divergence.
    pub fn checksum(&self) -> u64 {
        let seed = mix64(self.rng.checksum() ^ self.tick);
        self.resources.reduce(|cells| {
            cells.iter().fold(seed, |acc, &v| mix64(acc ^ v as u64))
        })
    }
}
