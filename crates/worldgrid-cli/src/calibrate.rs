use anyhow::{bail, ensure, Result};
use serde::Serialize;
use worldgrid_core::{
    EngineConfig, ExtractionRequest, MapExtent, Point, ResourceAmount, ResourceConfig,
    ResourceKind, Session, SupplySelection,
};

#[derive(Clone, Debug, Serialize)]
pub struct SupplyRow {
    pub selection: u8,
    pub label: &'static str,
    pub nominal_change_percent: i32,
    pub expected_change_percent: f64,
    pub measured_change_percent: f64,
    pub events: u64,
    pub draws: u64,
}

pub fn run(config: &EngineConfig, amount: ResourceAmount, trials: u32) -> Result<Vec<SupplyRow>> {
    ensure!(amount > 0, "amount must be positive");
    ensure!(trials > 0, "trials must be positive");
    if config.resources.is_inexhaustible(ResourceKind::Iron) {
        bail!("supply calibration needs exhaustible mines");
    }
    SupplySelection::all()
        .map(|selection| measure(config, selection, amount, trials))
        .collect()
}

fn measure(
    config: &EngineConfig,
    selection: SupplySelection,
    amount: ResourceAmount,
    trials: u32,
) -> Result<SupplyRow> {
    let mut events = 0u64;
    let mut draws = 0u64;
    for trial in 0..trials {
        let trial_config = EngineConfig {
            seed: config.seed.wrapping_add(trial as u64),
            history_capacity: 0,
            resources: ResourceConfig {
                supply: selection,
                ..config.resources.clone()
            },
        };
        let mut session = Session::from_amounts(trial_config, MapExtent::new(1, 1), vec![amount])?;
        let request = ExtractionRequest {
            entity: trial,
            center: Point::new(0, 0),
            radius: 0,
            kind: ResourceKind::Iron,
        };
        while session.extract(request).is_some() {
            session.advance_tick();
        }
        events += session.counters().events;
        draws += session.random().draws();
    }

    let events_per_unit = events as f64 / (amount as f64 * trials as f64);
    let expected = 1.0 / selection.policy().expected_units_per_event();
    Ok(SupplyRow {
        selection: selection.0,
        label: selection.label(),
        nominal_change_percent: selection.nominal_change_percent(),
        expected_change_percent: (expected - 1.0) * 100.0,
        measured_change_percent: (events_per_unit - 1.0) * 100.0,
        events,
        draws,
    })
}

pub fn print_table(rows: &[SupplyRow]) {
    println!(
        "{:>3}  {:<8} {:>9} {:>9} {:>9} {:>10}",
        "sel", "label", "nominal", "expected", "measured", "events"
    );
    for row in rows {
        println!(
            "{:>3}  {:<8} {:>8}% {:>8.1}% {:>8.1}% {:>10}",
            row.selection,
            row.label,
            row.nominal_change_percent,
            row.expected_change_percent,
            row.measured_change_percent,
            row.events
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_row_is_exact() {
        let rows = run(&EngineConfig::default(), 500, 2).unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].events, 1000);
        assert_eq!(rows[0].draws, 0);
        assert_eq!(rows[0].measured_change_percent, 0.0);
    }

    #[test]
    fn every_non_baseline_event_draws_once() {
        let rows = run(&EngineConfig::default(), 300, 1).unwrap();
        for row in &rows[1..] {
            assert_eq!(row.events, row.draws, "selection {}", row.selection);
        }
    }

    #[test]
    fn inexhaustible_config_is_refused() {
        let mut config = EngineConfig::default();
        config.resources.inexhaustible_mines = true;
        assert!(run(&config, 10, 1).is_err());
    }
}
