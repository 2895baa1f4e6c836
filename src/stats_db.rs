use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::provider::StatsProvider;
use crate::season::{SeasonBounds, current_year};
use crate::stat::StatName;
use crate::subject::{LeagueCode, Perspective, SubjectKind, SubjectRef};

const BUSY_TIMEOUT_SECS: u64 = 5;

/// One player's box score for one game. Missing stats stay `None` and are
/// stored as NULL, so they never drag an average towards zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatlineRecord {
    pub game_id: u64,
    pub season: i32,
    pub league_code: String,
    pub team_id: u32,
    pub opponent_team_id: u32,
    pub player_id: u32,
    #[serde(default)]
    pub pts: Option<f64>,
    #[serde(default)]
    pub ast: Option<f64>,
    #[serde(default)]
    pub dreb: Option<f64>,
    #[serde(default)]
    pub oreb: Option<f64>,
    #[serde(default)]
    pub treb: Option<f64>,
    #[serde(default)]
    pub stl: Option<f64>,
    #[serde(default)]
    pub blk: Option<f64>,
    #[serde(default)]
    pub tov: Option<f64>,
    #[serde(default)]
    pub fgm: Option<f64>,
    #[serde(default)]
    pub fga: Option<f64>,
    #[serde(default)]
    pub ftm: Option<f64>,
    #[serde(default)]
    pub fta: Option<f64>,
    #[serde(default, rename = "3pm")]
    pub tpm: Option<f64>,
    #[serde(default, rename = "3pa")]
    pub tpa: Option<f64>,
    #[serde(default)]
    pub pf: Option<f64>,
    #[serde(default)]
    pub mp: Option<f64>,
}

impl StatlineRecord {
    pub fn value(&self, stat: StatName) -> Option<f64> {
        match stat {
            StatName::Points => self.pts,
            StatName::Assists => self.ast,
            StatName::DefensiveRebounds => self.dreb,
            StatName::OffensiveRebounds => self.oreb,
            StatName::TotalRebounds => self.treb,
            StatName::Steals => self.stl,
            StatName::Blocks => self.blk,
            StatName::Turnovers => self.tov,
            StatName::FieldGoalsMade => self.fgm,
            StatName::FieldGoalsAttempted => self.fga,
            StatName::FreeThrowsMade => self.ftm,
            StatName::FreeThrowsAttempted => self.fta,
            StatName::ThreesMade => self.tpm,
            StatName::ThreesAttempted => self.tpa,
            StatName::PersonalFouls => self.pf,
            StatName::MinutesPlayed => self.mp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestRecord {
    League {
        code: String,
        #[serde(default)]
        name: Option<String>,
    },
    Team {
        team_id: u32,
        league_code: String,
        name: String,
    },
    Player {
        player_id: u32,
        name: String,
    },
    Statline(StatlineRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub leagues: usize,
    pub teams: usize,
    pub players: usize,
    pub statlines: usize,
    pub seasons: Vec<i32>,
}

/// SQLite-backed [`StatsProvider`]. Owns a small pool of long-lived
/// connections; callers never see a connection.
#[derive(Debug)]
pub struct StatsDb {
    pool: Vec<Mutex<Connection>>,
    next: AtomicUsize,
    bounds: SeasonBounds,
}

impl StatsDb {
    pub fn open(path: &Path, pool_size: usize, bounds: SeasonBounds) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let pool_size = pool_size.max(1);
        let mut pool = Vec::with_capacity(pool_size);
        for idx in 0..pool_size {
            let conn = Connection::open(path)?;
            conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
            if idx == 0 {
                init_schema(&conn)?;
            }
            pool.push(Mutex::new(conn));
        }
        debug!(path = %path.display(), pool_size, "opened stats db");
        Ok(Self {
            pool,
            next: AtomicUsize::new(0),
            bounds,
        })
    }

    pub fn open_in_memory(bounds: SeasonBounds) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            pool: vec![Mutex::new(conn)],
            next: AtomicUsize::new(0),
            bounds,
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        let start = self.next.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        for offset in 0..self.pool.len() {
            if let Ok(guard) = self.pool[(start + offset) % self.pool.len()].try_lock() {
                return guard;
            }
        }
        self.pool[start]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn upsert_league(&self, code: &str, name: Option<&str>) -> Result<LeagueCode> {
        upsert_league(&self.connection(), code, name)
    }

    pub fn upsert_team(&self, team_id: u32, league_code: &str, name: &str) -> Result<()> {
        upsert_team(&self.connection(), team_id, league_code, name)
    }

    pub fn upsert_player(&self, player_id: u32, name: &str) -> Result<()> {
        upsert_player(&self.connection(), player_id, name)
    }

    pub fn insert_statline(&self, row: &StatlineRecord) -> Result<()> {
        self.insert_statlines(std::slice::from_ref(row)).map(|_| ())
    }

    /// Writes all rows in one transaction; nothing is written if any row is
    /// rejected.
    pub fn insert_statlines(&self, rows: &[StatlineRecord]) -> Result<usize> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        for row in rows {
            upsert_statline(&tx, row, self.bounds)?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn apply_records(&self, records: &[IngestRecord]) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        for record in records {
            match record {
                IngestRecord::League { code, name } => {
                    upsert_league(&tx, code, name.as_deref())?;
                    summary.leagues += 1;
                }
                IngestRecord::Team {
                    team_id,
                    league_code,
                    name,
                } => {
                    upsert_team(&tx, *team_id, league_code, name)?;
                    summary.teams += 1;
                }
                IngestRecord::Player { player_id, name } => {
                    upsert_player(&tx, *player_id, name)?;
                    summary.players += 1;
                }
                IngestRecord::Statline(row) => {
                    upsert_statline(&tx, row, self.bounds)?;
                    summary.statlines += 1;
                    if !summary.seasons.contains(&row.season) {
                        summary.seasons.push(row.season);
                    }
                }
            }
        }
        for season in &summary.seasons {
            tx.execute(
                "INSERT OR IGNORE INTO seasons (season) VALUES (?1)",
                params![season],
            )?;
        }
        tx.commit()?;
        summary.seasons.sort_unstable();
        Ok(summary)
    }

    pub fn register_season(&self, season: i32) -> Result<bool> {
        let season = self.bounds.check(Some(season))?.unwrap_or(season);
        let inserted = self.connection().execute(
            "INSERT OR IGNORE INTO seasons (season) VALUES (?1)",
            params![season],
        )?;
        Ok(inserted > 0)
    }

    pub fn register_current_season(&self) -> Result<bool> {
        self.register_season(current_year())
    }

    pub fn known_seasons(&self) -> Result<Vec<i32>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT season FROM seasons ORDER BY season ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn subject_exists(&self, conn: &Connection, subject: &SubjectRef) -> Result<bool> {
        let (sql, key) = match subject {
            SubjectRef::Player(id) => (
                "SELECT 1 FROM players WHERE player_id = ?1",
                Value::Integer(*id as i64),
            ),
            SubjectRef::Team(id) => (
                "SELECT 1 FROM teams WHERE team_id = ?1",
                Value::Integer(*id as i64),
            ),
            SubjectRef::League(code) => (
                "SELECT 1 FROM leagues WHERE league_code = ?1",
                Value::Text(code.as_str().to_string()),
            ),
        };
        let found = conn
            .query_row(sql, params![key], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }
}

impl StatsProvider for StatsDb {
    fn average(
        &self,
        stat: StatName,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Option<f64>> {
        let values = self.averages(&[stat], subject, perspective, season)?;
        Ok(values.into_iter().next().flatten())
    }

    fn averages(
        &self,
        stats: &[StatName],
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Vec<Option<f64>>> {
        let season = self.bounds.check(season)?;
        if stats.is_empty() {
            return Ok(Vec::new());
        }
        let sql = average_query(stats, subject, perspective)?;

        let conn = self.connection();
        if !self.subject_exists(&conn, subject)? {
            return Err(MetricsError::UnknownSubject(subject.clone()));
        }
        let key = match subject {
            SubjectRef::Player(id) | SubjectRef::Team(id) => Value::Integer(*id as i64),
            SubjectRef::League(code) => Value::Text(code.as_str().to_string()),
        };
        let values = conn.query_row(&sql, params![key, season], |row| {
            (0..stats.len())
                .map(|idx| row.get::<_, Option<f64>>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;
        debug!(%subject, %perspective, ?season, stats = stats.len(), "averages query");
        Ok(values)
    }
}

fn average_query(
    stats: &[StatName],
    subject: &SubjectRef,
    perspective: Perspective,
) -> Result<String> {
    const SEASON_FILTER: &str = "(?2 IS NULL OR season = ?2)";

    // Team and league averages are over per-game team totals. A team-game
    // total exists only when every statline in it carries the stat; partial
    // totals stay NULL so AVG skips that game for that stat alone.
    let (filter, group_by) = match (subject, perspective) {
        (SubjectRef::Player(_), Perspective::Opponent) => {
            return Err(MetricsError::UnsupportedSubject {
                metric: "opponent averages",
                kind: SubjectKind::Player,
            });
        }
        (SubjectRef::Player(_), Perspective::Own) => {
            let columns = stats
                .iter()
                .map(|stat| format!("AVG({})", stat.column()))
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(format!(
                "SELECT {columns} FROM statlines WHERE player_id = ?1 AND {SEASON_FILTER}"
            ));
        }
        (SubjectRef::Team(_), Perspective::Own) => ("team_id = ?1", "game_id"),
        (SubjectRef::Team(_), Perspective::Opponent) => ("opponent_team_id = ?1", "game_id"),
        (SubjectRef::League(_), Perspective::Own) => ("league_code = ?1", "game_id, team_id"),
        (SubjectRef::League(_), Perspective::Opponent) => {
            ("league_code = ?1", "game_id, opponent_team_id")
        }
    };
    let sums = stats
        .iter()
        .enumerate()
        .map(|(idx, stat)| {
            let col = stat.column();
            format!("CASE WHEN COUNT({col}) = COUNT(*) THEN SUM({col}) END AS s{idx}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    let avgs = (0..stats.len())
        .map(|idx| format!("AVG(s{idx})"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "SELECT {avgs} FROM (SELECT {sums} FROM statlines WHERE {filter} AND {SEASON_FILTER} GROUP BY {group_by})"
    ))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS leagues (
            league_code TEXT PRIMARY KEY,
            name TEXT NULL
        );
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            league_code TEXT NOT NULL,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS seasons (
            season INTEGER PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS statlines (
            game_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
            league_code TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            opponent_team_id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            pts REAL NULL,
            ast REAL NULL,
            dreb REAL NULL,
            oreb REAL NULL,
            treb REAL NULL,
            stl REAL NULL,
            blk REAL NULL,
            tov REAL NULL,
            fgm REAL NULL,
            fga REAL NULL,
            ftm REAL NULL,
            fta REAL NULL,
            tpm REAL NULL,
            tpa REAL NULL,
            pf REAL NULL,
            mp REAL NULL,
            PRIMARY KEY (game_id, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_statlines_player ON statlines(player_id, season);
        CREATE INDEX IF NOT EXISTS idx_statlines_team ON statlines(team_id, season);
        CREATE INDEX IF NOT EXISTS idx_statlines_opponent ON statlines(opponent_team_id, season);
        CREATE INDEX IF NOT EXISTS idx_statlines_league ON statlines(league_code, season);
        "#,
    )?;
    Ok(())
}

fn upsert_league(conn: &Connection, code: &str, name: Option<&str>) -> Result<LeagueCode> {
    let code = LeagueCode::new(code)?;
    conn.execute(
        "INSERT INTO leagues (league_code, name) VALUES (?1, ?2)
         ON CONFLICT(league_code) DO UPDATE SET name = COALESCE(excluded.name, leagues.name)",
        params![code.as_str(), name],
    )?;
    Ok(code)
}

fn upsert_team(conn: &Connection, team_id: u32, league_code: &str, name: &str) -> Result<()> {
    let code = LeagueCode::new(league_code)?;
    conn.execute(
        "INSERT INTO teams (team_id, league_code, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(team_id) DO UPDATE SET league_code = excluded.league_code, name = excluded.name",
        params![team_id as i64, code.as_str(), name],
    )?;
    Ok(())
}

fn upsert_player(conn: &Connection, player_id: u32, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO players (player_id, name) VALUES (?1, ?2)
         ON CONFLICT(player_id) DO UPDATE SET name = excluded.name",
        params![player_id as i64, name],
    )?;
    Ok(())
}

fn upsert_statline(tx: &Connection, row: &StatlineRecord, bounds: SeasonBounds) -> Result<()> {
    bounds.check(Some(row.season))?;
    let league = LeagueCode::new(&row.league_code)?;
    if row.team_id == row.opponent_team_id {
        return Err(MetricsError::InvalidRequest(format!(
            "game {}: team {} listed as its own opponent",
            row.game_id, row.team_id
        )));
    }
    if let Some(stat) = StatName::ALL
        .into_iter()
        .find(|stat| row.value(*stat).is_some_and(|v| !v.is_finite()))
    {
        return Err(MetricsError::InvalidRequest(format!(
            "game {} player {}: {stat} is not a finite number",
            row.game_id, row.player_id
        )));
    }

    tx.execute(
        r#"
        INSERT INTO statlines (
            game_id, season, league_code, team_id, opponent_team_id, player_id,
            pts, ast, dreb, oreb, treb, stl, blk, tov,
            fgm, fga, ftm, fta, tpm, tpa, pf, mp
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
        )
        ON CONFLICT(game_id, player_id) DO UPDATE SET
            season = excluded.season,
            league_code = excluded.league_code,
            team_id = excluded.team_id,
            opponent_team_id = excluded.opponent_team_id,
            pts = excluded.pts,
            ast = excluded.ast,
            dreb = excluded.dreb,
            oreb = excluded.oreb,
            treb = excluded.treb,
            stl = excluded.stl,
            blk = excluded.blk,
            tov = excluded.tov,
            fgm = excluded.fgm,
            fga = excluded.fga,
            ftm = excluded.ftm,
            fta = excluded.fta,
            tpm = excluded.tpm,
            tpa = excluded.tpa,
            pf = excluded.pf,
            mp = excluded.mp
        "#,
        params![
            row.game_id as i64,
            row.season,
            league.as_str(),
            row.team_id as i64,
            row.opponent_team_id as i64,
            row.player_id as i64,
            row.pts,
            row.ast,
            row.dreb,
            row.oreb,
            row.treb,
            row.stl,
            row.blk,
            row.tov,
            row.fgm,
            row.fga,
            row.ftm,
            row.fta,
            row.tpm,
            row.tpa,
            row.pf,
            row.mp,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_query_groups_by_game() {
        let sql = average_query(
            &[StatName::Points, StatName::ThreesMade],
            &SubjectRef::Team(1),
            Perspective::Opponent,
        )
        .unwrap();
        assert!(
            sql.contains("CASE WHEN COUNT(tpm) = COUNT(*) THEN SUM(tpm) END AS s1"),
            "{sql}"
        );
        assert!(sql.contains("opponent_team_id = ?1"), "{sql}");
        assert!(sql.contains("GROUP BY game_id)"), "{sql}");
    }

    #[test]
    fn player_opponent_query_is_unsupported() {
        assert!(matches!(
            average_query(&[StatName::Points], &SubjectRef::Player(1), Perspective::Opponent),
            Err(MetricsError::UnsupportedSubject { .. })
        ));
    }
}
