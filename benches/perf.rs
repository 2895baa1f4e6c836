use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use hoops_metrics::StatName::*;
use hoops_metrics::report::UperContext;
use hoops_metrics::stats_db::StatlineRecord;
use hoops_metrics::{
    MemoryStats, MetricsEngine, Perspective, SeasonBounds, StatName, StatsDb, StatsProvider,
    SubjectRef,
};

const SEASON: Option<i32> = Some(2023);

fn box_score() -> Vec<(StatName, f64)> {
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

fn memory_engine() -> (MetricsEngine<MemoryStats>, UperContext) {
    let ctx = UperContext {
        team: SubjectRef::Team(4),
        league: SubjectRef::league("ITA1").expect("league code"),
    };
    let stats = MemoryStats::new()
        .with(&SubjectRef::Player(23), SEASON, &box_score())
        .with(&ctx.team, SEASON, &[(Assists, 20.0), (FieldGoalsMade, 35.0)])
        .with(
            &ctx.league,
            SEASON,
            &[
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
            ],
        );
    (MetricsEngine::new(stats), ctx)
}

fn seeded_db() -> StatsDb {
    let db = StatsDb::open_in_memory(SeasonBounds::default()).expect("in-memory db");
    db.upsert_league("ITA1", None).expect("league");
    for team in 1..=8u32 {
        db.upsert_team(team, "ITA1", &format!("Team {team}"))
            .expect("team");
    }
    for player in 1..=80u32 {
        db.upsert_player(player, &format!("Player {player}"))
            .expect("player");
    }
    let mut rows = Vec::new();
    for game in 0..200u64 {
        let home = (game % 8) as u32 + 1;
        let away = (home % 8) + 1;
        for (team, opponent) in [(home, away), (away, home)] {
            for slot in 0..10u32 {
                let player = (team - 1) * 10 + slot + 1;
                let base = (game as f64 + slot as f64) % 7.0;
                rows.push(StatlineRecord {
                    game_id: game,
                    season: 2023,
                    league_code: "ITA1".to_string(),
                    team_id: team,
                    opponent_team_id: opponent,
                    player_id: player,
                    pts: Some(4.0 + base * 2.0),
                    ast: Some(base / 2.0),
                    dreb: Some(base / 1.5),
                    oreb: Some(base / 4.0),
                    treb: Some(base / 1.5 + base / 4.0),
                    tov: Some(1.0 + base / 5.0),
                    fga: Some(3.0 + base),
                    fta: Some(base / 3.0),
                    ..StatlineRecord::default()
                });
            }
        }
    }
    db.insert_statlines(&rows).expect("statlines");
    db
}

fn bench_uper_memory(c: &mut Criterion) {
    let (engine, ctx) = memory_engine();
    let player = SubjectRef::Player(23);
    c.bench_function("uper_memory", |b| {
        b.iter(|| {
            let value = engine
                .uper(black_box(&player), &ctx.team, &ctx.league, SEASON)
                .unwrap();
            engine.provider().clear_calls();
            black_box(value);
        })
    });
}

fn bench_report_memory(c: &mut Criterion) {
    let (engine, ctx) = memory_engine();
    let player = SubjectRef::Player(23);
    c.bench_function("player_report_memory", |b| {
        b.iter(|| {
            let report = engine
                .report(black_box(&player), Some(&ctx), SEASON)
                .unwrap();
            engine.provider().clear_calls();
            black_box(report.metrics.len());
        })
    });
}

fn bench_sqlite_averages(c: &mut Criterion) {
    let db = seeded_db();
    let team = SubjectRef::Team(3);
    let league = SubjectRef::league("ITA1").expect("league code");
    c.bench_function("sqlite_team_opponent_averages", |b| {
        b.iter(|| {
            let values = db
                .averages(
                    black_box(&[FieldGoalsAttempted, DefensiveRebounds, Turnovers]),
                    &team,
                    Perspective::Opponent,
                    SEASON,
                )
                .unwrap();
            black_box(values);
        })
    });
    let engine = MetricsEngine::new(db);
    c.bench_function("sqlite_league_vop", |b| {
        b.iter(|| black_box(engine.vop(black_box(&league), SEASON).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_uper_memory,
    bench_report_memory,
    bench_sqlite_averages
);
criterion_main!(benches);
