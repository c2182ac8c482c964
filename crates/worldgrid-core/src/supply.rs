//! Mine supply policies: how often an extraction event consumes nothing, one
//! unit, or two units of a deposit.
//!
//! Increasing supply skips consumption with some chance. Because a skipped
//! unit is mined again later under the same odds, a skip chance `p` stretches
//! a deposit by `1 / (1 - p)`. Decreasing supply consumes a second unit with
//! some chance instead.

use serde::{Deserialize, Serialize};

/// `numerator / denominator`, decided by one draw in `[0, denominator)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Chance {
    numerator: u32,
    denominator: u32,
}

impl Chance {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        assert!(numerator > 0 && numerator <= denominator);
        Self {
            numerator,
            denominator,
        }
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn probability(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// True for exactly `numerator` of the `denominator` possible draws, taken
    /// from the bottom of the range.
    pub fn hits_low(&self, draw: u32) -> bool {
        draw < self.numerator
    }

    /// True for exactly `numerator` of the `denominator` possible draws, taken
    /// from the top of the range.
    pub fn hits_high(&self, draw: u32) -> bool {
        draw >= self.denominator - self.numerator
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SupplyPolicy {
    /// One unit per event, no draw.
    Baseline,
    /// Draw once; consume nothing when `skip` hits (low end), else one unit.
    SkipConsumption { skip: Chance },
    /// Consume one unit, then draw once; consume a second unit when `extra`
    /// hits (high end) and more than one unit is left.
    ExtraConsumption { extra: Chance },
}

impl SupplyPolicy {
    /// Mean units removed per event on a deposit large enough that the
    /// second-unit floor never applies.
    pub fn expected_units_per_event(&self) -> f64 {
        match self {
            SupplyPolicy::Baseline => 1.0,
            SupplyPolicy::SkipConsumption { skip } => 1.0 - skip.probability(),
            SupplyPolicy::ExtraConsumption { extra } => 1.0 + extra.probability(),
        }
    }
}

const POLICIES: [SupplyPolicy; 8] = [
    SupplyPolicy::Baseline,
    SupplyPolicy::SkipConsumption {
        skip: Chance::new(1, 3),
    },
    SupplyPolicy::SkipConsumption {
        skip: Chance::new(1, 4),
    },
    SupplyPolicy::SkipConsumption {
        skip: Chance::new(1, 5),
    },
    SupplyPolicy::SkipConsumption {
        skip: Chance::new(1, 2),
    },
    SupplyPolicy::SkipConsumption {
        skip: Chance::new(3, 4),
    },
    SupplyPolicy::ExtraConsumption {
        extra: Chance::new(1, 4),
    },
    SupplyPolicy::ExtraConsumption {
        extra: Chance::new(1, 2),
    },
];

const LABELS: [&str; 8] = ["Default", "50%", "33%", "25%", "100%", "300%", "-25%", "-50%"];
const NOMINAL_CHANGE_PERCENT: [i32; 8] = [0, 50, 33, 25, 100, 300, -25, -50];

/// Index into the supply policy table, fixed for a game. Indices the table
/// does not know (e.g. from a newer configuration) behave like the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplySelection(pub u8);

impl SupplySelection {
    pub const BASELINE: Self = Self(0);
    pub const COUNT: u8 = POLICIES.len() as u8;

    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }

    pub fn is_known(self) -> bool {
        self.0 < Self::COUNT
    }

    pub fn policy(self) -> SupplyPolicy {
        POLICIES
            .get(self.0 as usize)
            .copied()
            .unwrap_or(SupplyPolicy::Baseline)
    }

    pub fn label(self) -> &'static str {
        LABELS.get(self.0 as usize).copied().unwrap_or(LABELS[0])
    }

    /// Advertised change of total yield in percent. For decreases this is a
    /// nominal figure: a second unit with chance `p` leaves `1 / (1 + p)`.
    pub fn nominal_change_percent(self) -> i32 {
        NOMINAL_CHANGE_PERCENT
            .get(self.0 as usize)
            .copied()
            .unwrap_or(0)
    }
}
