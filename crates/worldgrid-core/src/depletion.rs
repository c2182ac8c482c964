//! Per-event depletion of point-local resources.
//!
//! Each extraction event is decided independently: at most one keyed draw at a
//! fixed site, then zero, one or two units leave the cell.

use crate::config::ResourceConfig;
use crate::grid::Grid;
use crate::point::Point;
use crate::random::{DecisionSource, DrawSite, EntityId, RandomDecisionKey};
use crate::supply::SupplyPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type ResourceAmount = u32;

pub const SUPPLY_DRAW_SITE: DrawSite = DrawSite::new("depletion.mine_supply");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Iron,
    Coal,
    Granite,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Gold,
        ResourceKind::Iron,
        ResourceKind::Coal,
        ResourceKind::Granite,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub point: Point,
    /// Units removed from the cell by this event.
    pub consumed: ResourceAmount,
    /// The supply draw, if the policy issued one.
    pub draw: Option<u32>,
}

/// First point within `radius` of `center` (ring order, see
/// [`crate::point::MapExtent::points_within`]) that still holds resources.
pub fn find_point_with_resource(
    resources: &Grid<ResourceAmount>,
    center: Point,
    radius: u32,
) -> Option<Point> {
    resources
        .extent()
        .points_within(center, radius)
        .into_iter()
        .find(|&p| resources.get(p) > 0)
}

/// Applies one extraction event at `point` by `entity`.
///
/// The caller must only extract from a cell that holds resources; an empty
/// cell panics. Inexhaustible deposits are left untouched without drawing.
pub fn deplete<S: DecisionSource + ?Sized>(
    config: &ResourceConfig,
    resources: &mut Grid<ResourceAmount>,
    point: Point,
    kind: ResourceKind,
    entity: EntityId,
    source: &mut S,
) -> ExtractionOutcome {
    let available = resources.get(point);
    assert!(
        available > 0,
        "extraction from empty point ({}, {})",
        point.x,
        point.y
    );
    if config.is_inexhaustible(kind) {
        return ExtractionOutcome {
            point,
            consumed: 0,
            draw: None,
        };
    }

    let (consumed, draw) = match config.supply.policy() {
        SupplyPolicy::Baseline => (1, None),
        SupplyPolicy::SkipConsumption { skip } => {
            let d = source.draw(RandomDecisionKey::new(
                SUPPLY_DRAW_SITE,
                entity,
                skip.denominator(),
            ));
            (if skip.hits_low(d) { 0 } else { 1 }, Some(d))
        }
        SupplyPolicy::ExtraConsumption { extra } => {
            let d = source.draw(RandomDecisionKey::new(
                SUPPLY_DRAW_SITE,
                entity,
                extra.denominator(),
            ));
            // The floor is checked after the first unit is gone.
            let second = extra.hits_high(d) && available - 1 > 1;
            (if second { 2 } else { 1 }, Some(d))
        }
    };

    resources.set(point, available - consumed);
    debug!(
        x = point.x,
        y = point.y,
        ?kind,
        entity,
        draw,
        consumed,
        remaining = available - consumed,
        "extraction"
    );
    ExtractionOutcome {
        point,
        consumed,
        draw,
    }
}
