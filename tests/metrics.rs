use hoops_metrics::StatName::*;
use hoops_metrics::report::{MetricKind, UperContext};
use hoops_metrics::{
    MemoryStats, MetricsEngine, MetricsError, Perspective, ReboundKind, SeasonBounds, StatName,
    SubjectRef,
};

const SEASON: Option<i32> = Some(2023);

fn player() -> SubjectRef {
    SubjectRef::Player(23)
}

fn team() -> SubjectRef {
    SubjectRef::Team(4)
}

fn league() -> SubjectRef {
    SubjectRef::league("ITA1").expect("valid league code")
}

fn player_stats() -> Vec<(StatName, f64)> {
    vec![
        (MinutesPlayed, 30.0),
        (Points, 20.0),
        (Assists, 5.0),
        (Turnovers, 2.0),
        (FieldGoalsMade, 8.0),
        (FieldGoalsAttempted, 16.0),
        (FreeThrowsMade, 3.0),
        (FreeThrowsAttempted, 4.0),
        (ThreesMade, 2.0),
        (TotalRebounds, 6.0),
        (OffensiveRebounds, 1.0),
        (DefensiveRebounds, 5.0),
        (Steals, 1.0),
        (Blocks, 0.5),
        (PersonalFouls, 2.0),
    ]
}

fn league_stats() -> Vec<(StatName, f64)> {
    vec![
        (Assists, 18.0),
        (FieldGoalsMade, 34.0),
        (FreeThrowsMade, 15.0),
        (PersonalFouls, 19.0),
        (FreeThrowsAttempted, 20.0),
        (Points, 105.0),
        (FieldGoalsAttempted, 85.0),
        (OffensiveRebounds, 11.0),
        (Turnovers, 14.0),
        (TotalRebounds, 44.0),
    ]
}

fn scenario(season: Option<i32>) -> MemoryStats {
    MemoryStats::with_bounds(SeasonBounds::pinned(1946, 2024))
        .with(&player(), season, &player_stats())
        .with(&team(), season, &[(Assists, 20.0), (FieldGoalsMade, 35.0)])
        .with(&league(), season, &league_stats())
}

fn engine(stats: MemoryStats) -> MetricsEngine<MemoryStats> {
    MetricsEngine::with_seasons(stats, SeasonBounds::pinned(1946, 2024))
}

#[test]
fn uper_regression_fixture() {
    let engine = engine(scenario(SEASON));
    let value = engine
        .uper(&player(), &team(), &league(), SEASON)
        .expect("uper should be defined");
    assert!(
        (value - -2.7452813685193136).abs() < 1e-9,
        "unexpected uPER {value}"
    );
}

#[test]
fn uper_fetches_every_average_for_the_same_season() {
    let engine = engine(scenario(SEASON).with(&player(), None, &player_stats()));
    engine.uper(&player(), &team(), &league(), SEASON).unwrap();

    let calls = engine.provider().calls();
    assert!(!calls.is_empty());
    assert!(calls.iter().all(|call| call.season == SEASON), "{calls:?}");
}

#[test]
fn career_uper_never_mixes_in_season_values() {
    let stats = scenario(None).with(&league(), SEASON, &[(PersonalFouls, 1.0)]);
    let engine = engine(stats);
    let career = engine.uper(&player(), &team(), &league(), None).unwrap();
    assert!(
        engine
            .provider()
            .calls()
            .iter()
            .all(|call| call.season.is_none())
    );

    let again = engine.uper(&player(), &team(), &league(), None).unwrap();
    assert_eq!(career.to_bits(), again.to_bits());
}

#[test]
fn uper_reports_every_missing_average() {
    let required: Vec<(SubjectRef, StatName)> = [
        MinutesPlayed,
        ThreesMade,
        Assists,
        FieldGoalsMade,
        FieldGoalsAttempted,
        FreeThrowsMade,
        FreeThrowsAttempted,
        Turnovers,
        TotalRebounds,
        OffensiveRebounds,
        Steals,
        Blocks,
        PersonalFouls,
    ]
    .into_iter()
    .map(|stat| (player(), stat))
    .chain([Assists, FieldGoalsMade].into_iter().map(|stat| (team(), stat)))
    .chain(league_stats().into_iter().map(|(stat, _)| (league(), stat)))
    .collect();
    assert_eq!(required.len(), 25);

    for (subject, stat) in required {
        let mut stats = scenario(SEASON);
        stats.remove(&subject, Perspective::Own, SEASON, stat);
        let err = engine(stats)
            .uper(&player(), &team(), &league(), SEASON)
            .unwrap_err();
        match err.root() {
            MetricsError::MissingStatistic {
                stat: missing,
                subject: owner,
                season,
                ..
            } => {
                assert_eq!(*missing, stat, "removed {stat} from {subject}");
                assert_eq!(*owner, subject);
                assert_eq!(*season, SEASON);
            }
            other => panic!("removed {stat} from {subject}: got {other:?}"),
        }
    }
}

#[test]
fn uper_annotates_failing_league_vop() {
    let stats = scenario(SEASON).with(
        &league(),
        SEASON,
        &[
            (FieldGoalsAttempted, 0.0),
            (OffensiveRebounds, 0.0),
            (Turnovers, 0.0),
            (FreeThrowsAttempted, 0.0),
        ],
    );
    let err = engine(stats)
        .uper(&player(), &team(), &league(), SEASON)
        .unwrap_err();
    assert!(
        matches!(
            &err,
            MetricsError::Step {
                metric: "uper",
                step: "league vop",
                ..
            }
        ),
        "{err:?}"
    );
    assert!(matches!(
        err.root(),
        MetricsError::DivisionByZero { formula: "vop", .. }
    ));
}

#[test]
fn uper_with_zero_minutes_is_division_by_zero() {
    let stats = scenario(SEASON).with(&player(), SEASON, &[(MinutesPlayed, 0.0)]);
    let err = engine(stats)
        .uper(&player(), &team(), &league(), SEASON)
        .unwrap_err();
    assert!(matches!(
        err,
        MetricsError::DivisionByZero {
            formula: "uper",
            term: "player.MP",
            ..
        }
    ));
}

#[test]
fn ast_to_ratio_with_zero_turnovers_is_division_by_zero() {
    let stats = MemoryStats::new().with(&player(), SEASON, &[(Assists, 5.0), (Turnovers, 0.0)]);
    let err = engine(stats).ast_to_ratio(&player(), SEASON).unwrap_err();
    assert!(matches!(err, MetricsError::DivisionByZero { term: "TOV", .. }));
}

#[test]
fn ast_to_ratio_with_missing_assists_is_missing_statistic() {
    let stats = MemoryStats::new().with(&player(), SEASON, &[(Turnovers, 2.0)]);
    let err = engine(stats).ast_to_ratio(&player(), SEASON).unwrap_err();
    assert!(matches!(err, MetricsError::MissingStatistic { stat: Assists, .. }));
}

#[test]
fn vop_with_no_possession_events_is_division_by_zero() {
    let stats = MemoryStats::new().with(
        &team(),
        SEASON,
        &[
            (Points, 0.0),
            (FieldGoalsAttempted, 0.0),
            (OffensiveRebounds, 0.0),
            (Turnovers, 0.0),
            (FreeThrowsAttempted, 0.0),
        ],
    );
    let err = engine(stats).vop(&team(), SEASON).unwrap_err();
    assert!(matches!(err, MetricsError::DivisionByZero { formula: "vop", .. }));
}

#[test]
fn total_rebound_pct_is_one_without_provider_calls() {
    let engine = engine(MemoryStats::new());
    for subject in [player(), team(), league()] {
        for season in [None, SEASON] {
            assert_eq!(
                engine
                    .rebound_pct(&subject, ReboundKind::Total, season)
                    .unwrap(),
                1.0
            );
        }
    }
    assert!(engine.provider().calls().is_empty());
}

#[test]
fn defensive_rebound_pct_for_team() {
    let stats = MemoryStats::new().with(
        &team(),
        SEASON,
        &[(TotalRebounds, 40.0), (OffensiveRebounds, 10.0)],
    );
    let value = engine(stats)
        .rebound_pct(&team(), ReboundKind::Defensive, SEASON)
        .unwrap();
    assert_eq!(value, 0.75);
}

#[test]
fn rebound_pct_with_no_rebounds_is_division_by_zero() {
    let stats = MemoryStats::new().with(
        &team(),
        SEASON,
        &[(TotalRebounds, 0.0), (DefensiveRebounds, 0.0)],
    );
    let err = engine(stats)
        .rebound_pct(&team(), ReboundKind::Offensive, SEASON)
        .unwrap_err();
    assert!(matches!(err, MetricsError::DivisionByZero { term: "TREB", .. }));
}

#[test]
fn possessions_reject_players() {
    let err = engine(scenario(SEASON))
        .possessions(&player(), SEASON)
        .unwrap_err();
    assert!(matches!(err, MetricsError::UnsupportedSubject { metric: "possessions", .. }));
}

#[test]
fn team_possessions_read_opponent_defensive_rebounds() {
    let stats = MemoryStats::new()
        .with(
            &team(),
            SEASON,
            &[
                (FieldGoalsAttempted, 85.0),
                (FieldGoalsMade, 38.0),
                (FreeThrowsAttempted, 22.0),
                (OffensiveRebounds, 10.0),
                (DefensiveRebounds, 1000.0),
                (Turnovers, 13.0),
            ],
        )
        .with_opponent(&team(), SEASON, &[(DefensiveRebounds, 30.0)]);
    let engine = engine(stats);
    let value = engine.possessions(&team(), SEASON).unwrap();
    let expected = 85.0 + 0.44 * 22.0 - 1.07 * (10.0 / 40.0) * 47.0 + 13.0;
    assert!((value - expected).abs() < 1e-9);

    let calls = engine.provider().calls();
    let dreb_from = |perspective: Perspective| {
        calls
            .iter()
            .any(|c| c.stat == DefensiveRebounds && c.perspective == perspective)
    };
    assert!(dreb_from(Perspective::Opponent));
    assert!(!dreb_from(Perspective::Own));
}

#[test]
fn possessions_guard_against_empty_glass() {
    let stats = MemoryStats::new()
        .with(
            &team(),
            SEASON,
            &[
                (FieldGoalsAttempted, 85.0),
                (FieldGoalsMade, 38.0),
                (FreeThrowsAttempted, 22.0),
                (OffensiveRebounds, 0.0),
                (Turnovers, 13.0),
            ],
        )
        .with_opponent(&team(), SEASON, &[(DefensiveRebounds, 0.0)]);
    let err = engine(stats).possessions(&team(), SEASON).unwrap_err();
    assert!(matches!(err, MetricsError::DivisionByZero { formula: "possessions", .. }));
}

#[test]
fn seasons_outside_bounds_are_rejected() {
    let engine = engine(scenario(SEASON));
    assert!(matches!(
        engine.ast_to_ratio(&player(), Some(1945)),
        Err(MetricsError::InvalidSeason { season: 1945, .. })
    ));
    assert!(matches!(
        engine.uper(&player(), &team(), &league(), Some(2025)),
        Err(MetricsError::InvalidSeason { season: 2025, .. })
    ));
    assert!(engine.provider().calls().is_empty());
}

#[test]
fn unknown_subjects_surface_from_the_provider() {
    let err = engine(scenario(SEASON))
        .vop(&SubjectRef::Team(999), SEASON)
        .unwrap_err();
    assert!(matches!(err, MetricsError::UnknownSubject(SubjectRef::Team(999))));
}

#[test]
fn report_keeps_going_past_undefined_metrics() {
    let stats = scenario(SEASON).with(&player(), SEASON, &[(Turnovers, 0.0)]);
    let engine = engine(stats);
    let ctx = UperContext {
        team: team(),
        league: league(),
    };
    let report = engine.report(&player(), Some(&ctx), SEASON).unwrap();
    assert!(report.value(MetricKind::AstToRatio).is_none());
    assert_eq!(report.value(MetricKind::Rbp), Some(1.0));
    assert!(report.value(MetricKind::Uper).is_some());
    assert!(report.value(MetricKind::Possessions).is_none());
    assert_eq!(report.undefined().count(), 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["subject"]["kind"], "player");
    assert_eq!(json["metrics"][0]["metric"], "ast_to_ratio");
    assert!(json["metrics"][0]["error"].is_string());
}
