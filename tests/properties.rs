use proptest::prelude::*;

use hoops_metrics::StatName::{Assists, Turnovers};
use hoops_metrics::formulas;
use hoops_metrics::{MemoryStats, MetricsEngine, ReboundKind, SubjectRef};

proptest! {
    #[test]
    fn ast_to_ratio_is_scale_invariant(
        ast in 0.0f64..50.0,
        tov in 0.01f64..20.0,
        scale in 0.01f64..100.0,
    ) {
        let base = formulas::ast_to_ratio(ast, tov).unwrap();
        let scaled = formulas::ast_to_ratio(ast * scale, tov * scale).unwrap();
        prop_assert!((base - scaled).abs() <= 1e-9 * base.abs().max(1.0));
    }

    #[test]
    fn engine_ratio_matches_the_pure_formula(
        ast in 0.0f64..50.0,
        tov in 0.01f64..20.0,
        scale in 0.01f64..100.0,
    ) {
        let player = SubjectRef::Player(1);
        let stats = MemoryStats::new()
            .with(&player, Some(2020), &[(Assists, ast), (Turnovers, tov)])
            .with(&player, None, &[(Assists, ast * scale), (Turnovers, tov * scale)]);
        let engine = MetricsEngine::new(stats);
        let season = engine.ast_to_ratio(&player, Some(2020)).unwrap();
        let career = engine.ast_to_ratio(&player, None).unwrap();
        prop_assert!((season - career).abs() <= 1e-9 * season.abs().max(1.0));
    }

    #[test]
    fn total_rebound_pct_is_always_one(
        id in any::<u32>(),
        season in proptest::option::of(1946i32..2024),
    ) {
        let engine = MetricsEngine::new(MemoryStats::new());
        let value = engine.rebound_pct(&SubjectRef::Team(id), ReboundKind::Total, season).unwrap();
        prop_assert_eq!(value, 1.0);
    }

    #[test]
    fn rebound_shares_stay_in_unit_range(treb in 0.1f64..80.0, frac in 0.0f64..=1.0) {
        let oreb = treb * frac;
        let drbp = formulas::defensive_rebound_pct(treb, oreb).unwrap();
        let orbp = formulas::offensive_rebound_pct(treb, treb - oreb).unwrap();
        prop_assert!((0.0..=1.0).contains(&drbp));
        prop_assert!((drbp + orbp - 1.0).abs() < 1e-9);
    }
}
