use super::Session;
use crate::depletion::ExtractionOutcome;
use serde::{Deserialize, Serialize};

/// Running tallies of extraction events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCounters {
    pub events: u64,
    pub units_consumed: u64,
    /// Events whose supply draw skipped consumption.
    pub skipped: u64,
    pub double_consumptions: u64,
    /// Events on inexhaustible deposits.
    pub inexhaustible: u64,
    /// Requests that found no resource in range.
    pub failed_lookups: u64,
}

impl ExtractionCounters {
    pub(crate) fn record(&mut self, outcome: &ExtractionOutcome) {
        self.events += 1;
        self.units_consumed += outcome.consumed as u64;
        match (outcome.consumed, outcome.draw) {
            (0, Some(_)) => self.skipped += 1,
            (0, None) => self.inexhaustible += 1,
            (2, _) => self.double_consumptions += 1,
            _ => {}
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionMetrics {
    pub tick: u64,
    pub draws: u64,
    pub random_checksum: u64,
    pub counters: ExtractionCounters,
    pub remaining_total: u64,
    pub depleted_cells: usize,
    pub checksum: u64,
}

impl Session {
    pub fn counters(&self) -> ExtractionCounters {
        self.counters
    }

    pub fn metrics(&self) -> SessionMetrics {
        let (remaining_total, depleted_cells) =
            self.resources.fold((0u64, 0usize), |(sum, empty), &v| {
                (sum + v as u64, empty + usize::from(v == 0))
            });
        SessionMetrics {
            tick: self.tick,
            draws: self.rng.draws(),
            random_checksum: self.rng.checksum(),
            counters: self.counters,
            remaining_total,
            depleted_cells,
            checksum: self.checksum(),
        }
    }
}
