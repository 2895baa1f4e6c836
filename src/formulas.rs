use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::subject::SubjectRef;

/// Share of free-throw attempts that end a possession.
pub const FT_POSSESSION_WEIGHT: f64 = 0.44;
/// Weight on missed field goals that the offense rebounds.
pub const OREB_MISS_WEIGHT: f64 = 1.07;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Undefined {
    pub formula: &'static str,
    pub term: &'static str,
    pub value: f64,
}

impl Undefined {
    pub fn into_error(self, subject: &SubjectRef) -> MetricsError {
        MetricsError::DivisionByZero {
            formula: self.formula,
            term: self.term,
            value: self.value,
            subject: subject.clone(),
        }
    }
}

pub type Outcome = Result<f64, Undefined>;

fn divide(formula: &'static str, term: &'static str, num: f64, den: f64) -> Outcome {
    if den == 0.0 || !den.is_finite() {
        return Err(Undefined {
            formula,
            term,
            value: den,
        });
    }
    finite(formula, num / den)
}

fn finite(formula: &'static str, value: f64) -> Outcome {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Undefined {
            formula,
            term: "result",
            value,
        })
    }
}

pub fn ast_to_ratio(ast: f64, tov: f64) -> Outcome {
    divide("ast_to_ratio", "TOV", ast, tov)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VopInputs {
    pub pts: f64,
    pub fga: f64,
    pub oreb: f64,
    pub tov: f64,
    pub fta: f64,
}

/// Points per possession-ending event. A non-positive event count has no
/// meaning and is reported the same way as a zero one.
pub fn vop(inputs: &VopInputs) -> Outcome {
    let events = inputs.fga - inputs.oreb + inputs.tov + FT_POSSESSION_WEIGHT * inputs.fta;
    if events <= 0.0 {
        return Err(Undefined {
            formula: "vop",
            term: "FGA - OREB + TOV + 0.44*FTA",
            value: events,
        });
    }
    divide("vop", "FGA - OREB + TOV + 0.44*FTA", inputs.pts, events)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReboundKind {
    Total,
    Defensive,
    Offensive,
}

impl fmt::Display for ReboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Total => "total",
            Self::Defensive => "defensive",
            Self::Offensive => "offensive",
        })
    }
}

impl FromStr for ReboundKind {
    type Err = MetricsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "total" | "t" | "rbp" => Ok(Self::Total),
            "defensive" | "d" | "drbp" => Ok(Self::Defensive),
            "offensive" | "o" | "orbp" => Ok(Self::Offensive),
            other => Err(MetricsError::InvalidRequest(format!(
                "unknown rebound percentage kind {other:?} (expected total, defensive or offensive)"
            ))),
        }
    }
}

pub fn defensive_rebound_pct(treb: f64, oreb: f64) -> Outcome {
    divide("rebound_pct", "TREB", treb - oreb, treb)
}

pub fn offensive_rebound_pct(treb: f64, dreb: f64) -> Outcome {
    divide("rebound_pct", "TREB", treb - dreb, treb)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PossessionInputs {
    pub fga: f64,
    pub fgm: f64,
    pub fta: f64,
    pub oreb: f64,
    pub tov: f64,
    pub opp_dreb: f64,
}

pub fn possessions(inputs: &PossessionInputs) -> Outcome {
    let oreb_share = divide(
        "possessions",
        "OREB + opponent DREB",
        inputs.oreb,
        inputs.oreb + inputs.opp_dreb,
    )?;
    finite(
        "possessions",
        inputs.fga + FT_POSSESSION_WEIGHT * inputs.fta
            - OREB_MISS_WEIGHT * oreb_share * (inputs.fga - inputs.fgm)
            + inputs.tov,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UperPlayer {
    pub mp: f64,
    pub tpm: f64,
    pub ast: f64,
    pub fgm: f64,
    pub fga: f64,
    pub ftm: f64,
    pub fta: f64,
    pub tov: f64,
    pub treb: f64,
    pub oreb: f64,
    pub stl: f64,
    pub blk: f64,
    pub pf: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UperTeam {
    pub ast: f64,
    pub fgm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UperLeague {
    pub ast: f64,
    pub fgm: f64,
    pub ftm: f64,
    pub fta: f64,
    pub pf: f64,
    pub vop: f64,
    pub drbp: f64,
}

pub fn uper(p: &UperPlayer, team: &UperTeam, lg: &UperLeague) -> Outcome {
    let per_minute = divide("uper", "player.MP", 1.0, p.mp)?;
    let lg_ast_per_fg = divide("uper", "league.FGM", lg.ast, lg.fgm)?;
    let lg_fg_per_ft = divide("uper", "league.FTM", lg.fgm, lg.ftm)?;
    let lg_ft_per_pf = divide("uper", "league.PF", lg.ftm, lg.pf)?;
    let lg_fta_per_pf = divide("uper", "league.PF", lg.fta, lg.pf)?;
    let team_ast_per_fg = divide("uper", "team.FGM", team.ast, team.fgm)?;

    let factor = 2.0 / 3.0 - (0.5 * lg_ast_per_fg) / (2.0 * lg_fg_per_ft);
    let vop = lg.vop;
    let drbp = lg.drbp;

    let total = p.tpm
        + (2.0 / 3.0) * p.ast
        + (2.0 - factor * team_ast_per_fg) * p.fgm
        + 0.5 * p.ftm * (2.0 - (1.0 / 3.0) * team_ast_per_fg)
        - vop * p.tov
        - vop * drbp * (p.fga * p.fgm)
        - vop * FT_POSSESSION_WEIGHT * (0.44 + 0.56 * drbp) * (p.fta - p.ftm)
        + vop * (1.0 - drbp) * (p.treb - p.oreb)
        + vop * drbp * p.oreb
        + vop * p.stl
        + vop * drbp * p.blk
        - p.pf * (lg_ft_per_pf - FT_POSSESSION_WEIGHT * lg_fta_per_pf * vop);

    finite("uper", per_minute * total)
}
