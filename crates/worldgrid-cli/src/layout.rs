//! A small generation pipeline on top of the analysis primitives: lattice
//! height map, tier classification, deposits on the top tier, then a mining
//! run on the result.

use anyhow::{ensure, Result};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use worldgrid_core::{
    analysis, EngineConfig, ExtractionRequest, Grid, MapExtent, Point, ResourceAmount,
    ResourceKind, Session, SessionMetrics, ValueRange,
};

const LATTICE_SPACING: u32 = 8;

pub struct LayoutParams {
    pub width: u32,
    pub height: u32,
    pub tiers: usize,
    pub deposit: ResourceAmount,
    pub miners: u32,
    pub ticks: u32,
}

#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub height_range: ValueRange<f32>,
    pub tier_counts: Vec<usize>,
    pub peak: Point,
    pub peak_neighbourhood_max: f32,
    pub deposit_cells: usize,
    pub deposit_height_range: Option<ValueRange<f32>>,
    pub mining: SessionMetrics,
}

struct Lattice {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Lattice {
    fn random(extent: MapExtent, rng: &mut ChaCha12Rng) -> Self {
        let width = (extent.width() / LATTICE_SPACING).max(1) as usize;
        let height = (extent.height() / LATTICE_SPACING).max(1) as usize;
        let values = (0..width * height)
            .map(|_| rng.random_range(0.0f32..100.0))
            .collect();
        Self {
            width,
            height,
            values,
        }
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.values[(y % self.height) * self.width + (x % self.width)]
    }

    /// Smoothstep-blended bilinear sample. The lattice wraps like the map.
    fn sample(&self, extent: MapExtent, p: Point) -> f32 {
        let gx = p.x as f32 * self.width as f32 / extent.width() as f32;
        let gy = p.y as f32 * self.height as f32 / extent.height() as f32;
        let (x0, y0) = (gx.floor() as usize, gy.floor() as usize);
        let smooth = |t: f32| t * t * (3.0 - 2.0 * t);
        let (tx, ty) = (smooth(gx.fract()), smooth(gy.fract()));
        let top = self.at(x0, y0) * (1.0 - tx) + self.at(x0 + 1, y0) * tx;
        let bottom = self.at(x0, y0 + 1) * (1.0 - tx) + self.at(x0 + 1, y0 + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

pub fn run(config: &EngineConfig, params: &LayoutParams) -> Result<LayoutReport> {
    ensure!(params.tiers > 0, "tiers must be positive");
    ensure!(params.deposit > 0, "deposit must be positive");
    let extent = MapExtent::try_new(params.width, params.height)?;

    // Generation randomness is separate from the simulation stream.
    let mut rng = ChaCha12Rng::seed_from_u64(config.seed ^ 0x6C61_796F_7574);
    let lattice = Lattice::random(extent, &mut rng);
    let heights = Grid::par_from_fn(extent, |p| lattice.sample(extent, p));

    let height_range = analysis::range(&heights);
    let tier_counts = analysis::histogram(&heights, params.tiers);
    let peak = analysis::maximum_point(&heights);
    let peak_neighbourhood_max = analysis::maximum_in(&heights, extent.neighbors8(peak));

    let top_tier = params.tiers - 1;
    let deposit_points = analysis::select_points(extent, |p| {
        analysis::map_value_to_index(heights.get(p), &height_range, params.tiers) == top_tier
    });
    let deposit_height_range = if deposit_points.is_empty() {
        None
    } else {
        Some(analysis::range_in(&heights, deposit_points.iter().copied()))
    };

    let mut resources = Grid::new(extent, 0);
    analysis::set_values(
        &mut resources,
        deposit_points.iter().copied(),
        params.deposit,
    );

    let mut session = Session::try_new(config.clone(), resources)?;
    let miners: Vec<ExtractionRequest> = (0..params.miners)
        .map(|entity| ExtractionRequest {
            entity,
            // Miners settle next to deposits when there are any.
            center: if deposit_points.is_empty() {
                Point::new(
                    rng.random_range(0..extent.width()),
                    rng.random_range(0..extent.height()),
                )
            } else {
                deposit_points[rng.random_range(0..deposit_points.len())]
            },
            radius: 2,
            kind: ResourceKind::ALL[entity as usize % ResourceKind::ALL.len()],
        })
        .collect();
    for _ in 0..params.ticks {
        session.advance_tick();
        for miner in &miners {
            session.extract(*miner);
        }
    }

    Ok(LayoutReport {
        width: extent.width(),
        height: extent.height(),
        seed: config.seed,
        height_range,
        tier_counts,
        peak,
        peak_neighbourhood_max,
        deposit_cells: deposit_points.len(),
        deposit_height_range,
        mining: session.metrics(),
    })
}

pub fn print_summary(report: &LayoutReport) {
    println!(
        "{}x{} map, seed {}",
        report.width, report.height, report.seed
    );
    println!(
        "heights {:.2}..{:.2}, peak at ({}, {}), highest neighbour {:.2}",
        report.height_range.minimum(),
        report.height_range.maximum(),
        report.peak.x,
        report.peak.y,
        report.peak_neighbourhood_max
    );
    for (tier, count) in report.tier_counts.iter().enumerate() {
        println!("  tier {tier}: {count} cells");
    }
    println!("deposit cells: {}", report.deposit_cells);
    let m = &report.mining;
    println!(
        "after {} ticks: {} events, {} units mined, {} remaining, {} cells exhausted",
        m.tick,
        m.counters.events,
        m.counters.units_consumed,
        m.remaining_total,
        m.depleted_cells
    );
    println!("checksum {:016x}", m.checksum);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LayoutParams {
        LayoutParams {
            width: 32,
            height: 24,
            tiers: 4,
            deposit: 5,
            miners: 6,
            ticks: 30,
        }
    }

    #[test]
    fn same_seed_same_report() {
        let config = EngineConfig::default();
        let a = run(&config, &params()).unwrap();
        let b = run(&config, &params()).unwrap();
        assert_eq!(a.mining.checksum, b.mining.checksum);
        assert_eq!(a.tier_counts, b.tier_counts);
        assert_eq!(a.peak, b.peak);
    }

    #[test]
    fn deposits_sit_on_the_top_tier() {
        let report = run(&EngineConfig::default(), &params()).unwrap();
        assert_eq!(report.tier_counts.iter().sum::<usize>(), 32 * 24);
        assert_eq!(report.deposit_cells, report.tier_counts[3]);
        assert!(report.deposit_cells > 0);
        let deposit_range = report.deposit_height_range.unwrap();
        assert_eq!(deposit_range.maximum(), report.height_range.maximum());
        let top = report.height_range.maximum();
        assert!(report.peak_neighbourhood_max <= top);
        assert_eq!(
            report.mining.remaining_total + report.mining.counters.units_consumed,
            report.deposit_cells as u64 * 5
        );
    }

    #[test]
    fn zero_sized_map_is_an_error() {
        let bad = LayoutParams {
            width: 0,
            ..params()
        };
        assert!(run(&EngineConfig::default(), &bad).is_err());
    }
}
